//! Prompt bundles
//!
//! Plain configuration records: instruction/few-shot template text plus the
//! JSON schema constraining the model's answer. Rendering is stateless;
//! nothing here holds mutable state, and the removal schema is rebuilt per
//! call from whatever field set the caller supplies.

use chrono::{Datelike, NaiveDate};
use serde_json::{json, Map, Value};

use report_agent_core::Field;

fn single_key_schema(key: &str, value_type: &str) -> Value {
    let mut properties = Map::new();
    properties.insert(key.to_string(), json!({ "type": value_type }));
    json!({
        "type": "object",
        "properties": properties,
        "required": [key]
    })
}

/// Binary decision prompt (casual-conversation and confirmation checks)
pub struct RecognizerPrompt {
    pub name: &'static str,
    pub system: &'static str,
    pub instruction: &'static str,
    pub few_shot: &'static str,
    /// Key the model answers under, also the schema's single property
    pub answer_key: &'static str,
}

impl RecognizerPrompt {
    pub fn casual() -> Self {
        Self {
            name: "casual-recognizer",
            system: "You are an assistant that checks whether the user's query is casual \
                     conversation or a report request. Answer in JSON.",
            instruction: "\
# Guidelines:
- The query is casual conversation when it is not related to any report question.
- Return {\"is_normal_conversation\": 1} for casual conversation, {\"is_normal_conversation\": 0} otherwise.",
            few_shot: "\
# Examples:
- User: \"Hello bot how are you today?\"
- Assistant: {\"is_normal_conversation\": 1}

- User: \"No username please\"
- Assistant: {\"is_normal_conversation\": 0}

- User: \"I want to get winlost report day 15 for sportsbook and user leon2346 only\"
- Assistant: {\"is_normal_conversation\": 0}

- User: \"See you later. Bye.\"
- Assistant: {\"is_normal_conversation\": 1}

- User: \"I want to get Winlost Report\"
- Assistant: {\"is_normal_conversation\": 0}

- User: \"Hey what is the weather in Tokyo?\"
- Assistant: {\"is_normal_conversation\": 1}",
            answer_key: "is_normal_conversation",
        }
    }

    pub fn confirmation() -> Self {
        Self {
            name: "confirmation-recognizer",
            system: "You are an assistant that detects whether the user confirms a proposed \
                     request. Answer in JSON.",
            instruction: "\
# Guidelines:
- Return {\"is_confirmed\": 1} for confirmation, {\"is_confirmed\": 0} for anything else.
- Confirmation includes direct forms (\"confirm\", \"yes\", \"correct\", \"agreed\", \"approve\"),
  casual forms (\"ok\", \"okay\", \"oke\", \"sure\", \"alright\", \"yep\", \"yeah\"),
  action forms (\"let's do it\", \"go ahead\", \"proceed\", \"I'm ready\", \"do it\"),
  and positive acknowledgement (\"sounds good\", \"that works\", \"perfect\", \"exactly\").",
            few_shot: "\
# Examples:
- User: \"I want to confirm it\"
- Assistant: {\"is_confirmed\": 1}

- User: \"Yes, do it.\"
- Assistant: {\"is_confirmed\": 1}

- User: \"No, I changed my mind.\"
- Assistant: {\"is_confirmed\": 0}

- User: \"Oke\"
- Assistant: {\"is_confirmed\": 1}

- User: \"Let's do it\"
- Assistant: {\"is_confirmed\": 1}

- User: \"No, I meant for the last week.\"
- Assistant: {\"is_confirmed\": 0}",
            answer_key: "is_confirmed",
        }
    }

    pub fn render(&self, query: &str) -> String {
        format!(
            "# User's query\n{query}\n\n{instruction}\n\n{few_shot}",
            instruction = self.instruction,
            few_shot = self.few_shot
        )
    }

    pub fn schema(&self) -> Value {
        single_key_schema(self.answer_key, "integer")
    }
}

/// Report selection prompt
pub struct SelectorPrompt;

impl SelectorPrompt {
    pub const SYSTEM: &'static str =
        "You are an assistant that determines which report a user's query refers to. \
         Answer in JSON.";

    pub fn render(message: &str, descriptions: &str, abbreviations: &str) -> String {
        format!(
            "\
User request: {message}

# Guidelines:
- Identify which report is being referenced, including common abbreviations and variations.
- If the request is unclear or not related to any report, return \"N/A\".
- Available reports:
{descriptions}
- Report abbreviations:
{abbreviations}

# Examples:
- User: \"I need to see the win/loss report from last week\"
- Assistant: {{\"function_called\": \"/winlost_detail\"}}

- User: \"w/l please bro\"
- Assistant: {{\"function_called\": \"/winlost_detail\"}}

- User: \"TO report day 15\"
- Assistant: {{\"function_called\": \"/turnover\"}}

- User: \"Top 40 Outstanding of Sportsbook\"
- Assistant: {{\"function_called\": \"/topoutstanding\"}}

- User: \"My current outstanding\"
- Assistant: {{\"function_called\": \"/outstanding\"}}

- User: \"I want Sportsbook only\"
- Assistant: {{\"function_called\": \"N/A\"}}

- User: \"Hello how are you today?\"
- Assistant: {{\"function_called\": \"N/A\"}}

Based on this request, which report should be called? Return only the JSON response."
        )
    }

    pub fn schema(endpoints: &[&str]) -> Value {
        let mut values: Vec<Value> = endpoints.iter().map(|e| json!(e)).collect();
        values.push(json!("N/A"));
        json!({
            "type": "object",
            "properties": {
                "function_called": {
                    "type": "string",
                    "description": "The report endpoint to call",
                    "enum": values
                }
            },
            "required": ["function_called"]
        })
    }
}

/// Date-range extraction prompt.
///
/// The model only has to recognize which dates or relative phrase the user
/// typed; relative phrases are resolved by deterministic date arithmetic in
/// code afterwards.
pub struct DateRangePrompt;

impl DateRangePrompt {
    pub const SYSTEM: &'static str =
        "You are a named-entity extraction assistant for report date ranges. Answer in JSON.";

    pub fn render(query: &str, today: NaiveDate) -> String {
        format!(
            "\
User request: {query}

Current date: {today}
Current year: {year}
Current month: {month:02}

# Your task:
- Detect the date or date range mentioned in the request.
- Return dates as DD/MM/YYYY.
- If a single day is mentioned (e.g. \"day 10\"), use the current month and year and set
  both from_date and to_date to that day.
- If a relative expression is used (today, yesterday, this week, last week, this month,
  last month, this year, last year), put that expression in date_range and leave
  from_date and to_date as \"N/A\".
- If no date is mentioned at all, return \"N/A\" for all three keys.

# Examples:
- User: \"Get me a win loss report from 01/02/2024 to 15/02/2024\"
- Assistant: {{\"date_range\": \"01/02/2024 to 15/02/2024\", \"from_date\": \"01/02/2024\", \"to_date\": \"15/02/2024\"}}

- User: \"turnover for last week please\"
- Assistant: {{\"date_range\": \"last week\", \"from_date\": \"N/A\", \"to_date\": \"N/A\"}}

- User: \"wl report day 26\"
- Assistant: {{\"date_range\": \"26/{month:02}/{year}\", \"from_date\": \"26/{month:02}/{year}\", \"to_date\": \"26/{month:02}/{year}\"}}

- User: \"Win/Loss details for Product Sportsbook\"
- Assistant: {{\"date_range\": \"N/A\", \"from_date\": \"N/A\", \"to_date\": \"N/A\"}}",
            year = today.year(),
            month = today.month(),
        )
    }

    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "date_range": { "type": "string" },
                "from_date": { "type": "string" },
                "to_date": { "type": "string" }
            },
            "required": ["date_range", "from_date", "to_date"]
        })
    }
}

/// Single categorical field extraction prompt
pub struct CategoryPrompt {
    pub field: Field,
}

impl CategoryPrompt {
    pub const SYSTEM: &'static str =
        "You are a named-entity extraction assistant for report parameters. Answer in JSON.";

    pub fn render(&self, query: &str, values: &[String], aliases: &str) -> String {
        let name = self.field.name();
        let label = self.field.label();
        format!(
            "\
User request: {query}

# Your task:
- Detect which {label} the request refers to, if any.
- The only valid values are: {values}.
- Recognize the abbreviations below and answer with the expanded value.
- If the {label} is not mentioned, return \"All\".

# Abbreviations:
{aliases}

Return JSON with the single key \"{name}\".",
            values = values.join(", "),
        )
    }

    pub fn schema(&self) -> Value {
        single_key_schema(self.field.name(), "string")
    }
}

/// Free-text username extraction prompt
pub struct UserPrompt;

impl UserPrompt {
    pub const SYSTEM: &'static str =
        "You are a named-entity extraction assistant for report parameters. Answer in JSON.";

    pub fn render(query: &str) -> String {
        format!(
            "\
User request: {query}

# Your task:
- Detect the single username (account id) the request refers to, e.g. \"master12\" or
  \"leon2346\".
- A username is one word. Product names, levels and dates are not usernames.
- If no username is mentioned, return \"N/A\".

Return JSON with the single key \"user\"."
        )
    }

    pub fn schema() -> Value {
        single_key_schema("user", "string")
    }
}

/// Combined extraction prompt for the outstanding report
pub struct OutstandingPrompt;

impl OutstandingPrompt {
    pub const SYSTEM: &'static str =
        "You are a named-entity extraction assistant for the Outstanding Report. Answer in JSON.";

    pub fn render(query: &str, values: &[String], aliases: &str) -> String {
        format!(
            "\
User request: {query}

# Your task:
- Extract the product and the username from the request.
- Valid products: {values}. If the product is not mentioned, return \"All\".
- If the username is not mentioned, return \"N/A\".

# Abbreviations:
{aliases}

# Examples:
- User: \"My current outstanding\"
- Assistant: {{\"product\": \"All\", \"user\": \"N/A\"}}

- User: \"The outstanding of Master1\"
- Assistant: {{\"product\": \"All\", \"user\": \"Master1\"}}

- User: \"Outstanding report for Product Sportsbook\"
- Assistant: {{\"product\": \"Sportsbook\", \"user\": \"N/A\"}}",
            values = values.join(", "),
        )
    }

    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "product": { "type": "string" },
                "user": { "type": "string" }
            },
            "required": ["product", "user"]
        })
    }
}

/// Combined extraction prompt for the top-outstanding report
pub struct TopOutstandingPrompt;

impl TopOutstandingPrompt {
    pub const SYSTEM: &'static str =
        "You are a named-entity extraction assistant for the Top Outstanding Report. \
         Answer in JSON.";

    pub fn render(query: &str, values: &[String], aliases: &str) -> String {
        format!(
            "\
User request: {query}

# Your task:
- Extract the product and the requested row count (top) from the request.
- Valid products: {values}. If the product is not mentioned, return \"All\".
- If the top count is not mentioned, return 10.
- Detect the top number exactly as written.

# Abbreviations:
{aliases}

# Examples:
- User: \"I want to get top outstanding\"
- Assistant: {{\"product\": \"All\", \"top\": 10}}

- User: \"Top 40 Outstanding of Sportsbook\"
- Assistant: {{\"product\": \"Sportsbook\", \"top\": 40}}

- User: \"give me the first 20 outstanding sorting from highest to lowest\"
- Assistant: {{\"product\": \"All\", \"top\": 20}}

- User: \"top 200 outstanding for Number Game\"
- Assistant: {{\"product\": \"Number Game\", \"top\": 200}}",
            values = values.join(", "),
        )
    }

    pub fn schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "product": { "type": "string" },
                "top": { "type": "integer" }
            },
            "required": ["product", "top"]
        })
    }
}

/// Removal-intent prompt.
///
/// The schema's field enum is regenerated per call from the caller's live
/// field set, so the model can only name fields that exist in context.
pub struct RemovalPrompt;

impl RemovalPrompt {
    pub const SYSTEM: &'static str =
        "You are an assistant that identifies which parameters the user wants to remove \
         from their request. Answer in JSON.";

    pub fn render(message: &str, field_names: &str) -> String {
        format!(
            "\
# User's message
{message}

# Guidelines:
- Detect whether the message asks to remove or reset parameters, such as \"no user
  please\" or \"delete product detail\". Otherwise default to an empty list.
- The known parameters are: {field_names}.

# Examples:
- User: \"No username please\"
- Assistant: {{\"params2delete\": [\"user\"]}}

- User: \"Remove the date range\"
- Assistant: {{\"params2delete\": [\"from_date\", \"to_date\"]}}

- User: \"I want to winlost report, no username and level please\"
- Assistant: {{\"params2delete\": [\"user\", \"level\"]}}

- User: \"Please roll back the date range to default\"
- Assistant: {{\"params2delete\": [\"from_date\", \"to_date\"]}}

- User: \"I want to get winlost report for Sportsbook only\"
- Assistant: {{\"params2delete\": []}}

- User: \"Top 23 outstanding for Number Game\"
- Assistant: {{\"params2delete\": []}}

- User: \"Get the data for user124\"
- Assistant: {{\"params2delete\": []}}

- User: \"Change the date to last week\"
- Assistant: {{\"params2delete\": []}}"
        )
    }

    pub fn schema(fields: &[Field]) -> Value {
        let names: Vec<Value> = fields.iter().map(|f| json!(f.name())).collect();
        json!({
            "type": "object",
            "properties": {
                "params2delete": {
                    "type": "array",
                    "items": {
                        "type": "string",
                        "enum": names
                    }
                }
            },
            "required": ["params2delete"]
        })
    }
}

/// Casual-conversation reply prompt
pub struct GreetingPrompt;

impl GreetingPrompt {
    pub const SYSTEM: &'static str = "\
You are a friendly and helpful report assistant trained to greet users.

Remember to:
- Keep a conversational and professional tone 📖
- Acknowledge the user's message clearly 👍
- Use natural, conversational language 💬
- Respond in English";

    pub fn render(message: &str) -> String {
        format!(
            "\
# User's message
{message}

# Example:
## User: Hello how are you today?
## Assistant: 👋 Hello! I'm a 🤖 friendly report assistant. How can I help you today? 😊

## User: Bye see you again.
## Assistant: 👋 Goodbye! Have a great day! 😊 See you next time! 👋"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizer_schema_has_single_required_key() {
        let prompt = RecognizerPrompt::confirmation();
        let schema = prompt.schema();
        assert_eq!(schema["required"][0], "is_confirmed");
        assert_eq!(
            schema["properties"]["is_confirmed"]["type"],
            "integer"
        );
    }

    #[test]
    fn selector_schema_includes_unresolved_sentinel() {
        let schema = SelectorPrompt::schema(&["/winlost_detail", "/turnover"]);
        let values = schema["properties"]["function_called"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(values.len(), 3);
        assert_eq!(values.last().unwrap(), "N/A");
    }

    #[test]
    fn removal_schema_is_constrained_to_live_fields() {
        let schema = RemovalPrompt::schema(&[Field::Product, Field::Top]);
        let names = schema["properties"]["params2delete"]["items"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(names, &vec![json!("product"), json!("top")]);
    }

    #[test]
    fn date_prompt_carries_current_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let rendered = DateRangePrompt::render("wl day 26", today);
        assert!(rendered.contains("2024-03-05"));
        assert!(rendered.contains("26/03/2024"));
    }

    #[test]
    fn category_prompt_names_its_field() {
        let prompt = CategoryPrompt {
            field: Field::ProductDetail,
        };
        let rendered = prompt.render("query", &["SABA Soccer".to_string()], "- none");
        assert!(rendered.contains("product_detail"));
        let schema = prompt.schema();
        assert_eq!(schema["required"][0], "product_detail");
    }
}
