//! System prompt and per-category schema templates used to instruct the model
//! to return strict JSON.

use crate::record::Category;

pub const SYSTEM_PROMPT: &str = "You are an automated contract parser. ONLY return valid JSON that matches the requested schema.\n\
Do not add any explanation, commentary, or code fences. \
If a field is unavailable, return null. \
Prefer numeric values where appropriate. \
If currency is not explicit, set currency to 'unknown'.";

/// Example JSON schema for a loan agreement.
pub const LOAN_SCHEMA: &str = r#"
{
  "contract_type": "loan_agreement",
  "summary": "short text",
  "financials": {
    "money_in": {
      "total_annually": number,
      "total_monthly": number,
      "items": [
        {
          "label": "",
          "amount_monthly": number,
          "amount_annually": number,
          "notes": ""
        }
      ]
    },
    "money_out": {
      "total_annually": number,
      "total_monthly": number,
      "items": [
        {
          "label": "",
          "amount": number,
          "notes": ""
        }
      ]
    },
    "rates": {
      "interest_rate_percent": number,
      "service_fee_percent": null
    },
    "currency": "INR"
  },
  "raw_extracted_fields": {
    "found_values": ["..."]
  }
}
"#;

/// Example JSON schema for a software licensing contract.
pub const SOFT_SCHEMA: &str = r#"
{
  "contract_type": "software_licensing",
  "summary": "short text",
  "financials": {
    "money_in": {
      "total_annually": number,
      "total_monthly": number,
      "items": [
        {
          "label": "license_fee",
          "amount_monthly": null,
          "amount_annually": number,
          "notes": ""
        }
      ]
    },
    "money_out": {
      "total_annually": number,
      "total_monthly": number,
      "items": [
        {
          "label": "support_cost_monthly",
          "amount": number,
          "notes": ""
        }
      ]
    },
    "rates": {
      "interest_rate_percent": null,
      "service_fee_percent": number
    },
    "currency": "INR"
  },
  "raw_extracted_fields": {
    "found_values": ["..."]
  }
}
"#;

pub fn schema_for(category: Category) -> &'static str {
    match category {
        Category::LoanAgreement => LOAN_SCHEMA,
        Category::SoftwareLicensing | Category::Unknown => SOFT_SCHEMA,
    }
}

pub fn build_user_prompt(category: Category, contract_text: &str) -> String {
    format!(
        "Contract type: {category}\n\n\
         Expected JSON schema:\n{schema}\n\n\
         Extract the financials from the following contract text. \
         Return ONLY JSON that follows the schema. Use null when unavailable. \
         If you find amounts in a currency write the currency in the 'currency' field.\n\n\
         --- CONTRACT TEXT START ---\n{contract_text}\n--- CONTRACT TEXT END ---",
        schema = schema_for(category),
    )
}
