//! The ordered rule cascade applied to every token after NAME and DESIGNATION.
//!
//! Rules are tried top to bottom and the first one that returns a value claims
//! the token. Several signatures overlap (a dashed number is both phone-like and
//! numeric, a state line also matches the city pattern), so the order of
//! [`CASCADE`] decides the outcome.

use crate::models::card::FieldName;

use super::patterns::{
    CITY_BEFORE_STATE, LABELLED_PINCODE, PINCODE_EXACT, PINCODE_LABEL_WIDTH, STATE_CANONICAL,
    STATE_SPELLINGS, WEBSITE_MARKERS,
};

/// A single predicate/action pair of the cascade.
#[derive(Clone, Copy)]
pub struct Rule {
    /// Short identifier shown in classification traces.
    pub name: &'static str,
    /// Field that receives the value when the rule matches.
    pub field: FieldName,
    apply: fn(&str) -> Option<String>,
}

impl Rule {
    /// Build a rule for a custom cascade (see [`RuleCascade::with_rules`]).
    ///
    /// [`RuleCascade::with_rules`]: super::RuleCascade::with_rules
    pub const fn new(name: &'static str, field: FieldName, apply: fn(&str) -> Option<String>) -> Self {
        Self { name, field, apply }
    }

    /// Value this rule assigns to `token`, or `None` when it does not match.
    pub fn apply(&self, token: &str) -> Option<String> {
        (self.apply)(token)
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("field", &self.field)
            .finish()
    }
}

/// The cascade in evaluation order. The last rule always matches.
pub static CASCADE: [Rule; 10] = [
    Rule { name: "phone", field: FieldName::Contact, apply: phone },
    Rule { name: "email", field: FieldName::Email, apply: email },
    Rule { name: "website", field: FieldName::Website, apply: website },
    Rule { name: "state", field: FieldName::State, apply: state },
    Rule { name: "pincode", field: FieldName::Pincode, apply: pincode },
    Rule { name: "long-number", field: FieldName::Pincode, apply: long_number },
    Rule { name: "labelled-pincode", field: FieldName::Pincode, apply: labelled_pincode },
    Rule { name: "city", field: FieldName::City, apply: city },
    Rule { name: "company", field: FieldName::CompanyName, apply: company },
    Rule { name: "address", field: FieldName::Address, apply: address },
];

fn is_all_digits(text: &str) -> bool {
    !text.is_empty() && text.chars().all(|c| c.is_ascii_digit())
}

fn phone(token: &str) -> Option<String> {
    let undashed = token.replace('-', "");
    let dashed_number = token.contains('-') && is_all_digits(&undashed);
    (token.starts_with('+') || dashed_number).then(|| token.to_string())
}

fn email(token: &str) -> Option<String> {
    (token.contains('@') && token.contains(".com")).then(|| token.to_lowercase())
}

fn website(token: &str) -> Option<String> {
    let lower = token.to_lowercase();
    let marked = WEBSITE_MARKERS.iter().any(|marker| lower.contains(marker));
    (marked && token.contains(".com")).then_some(lower)
}

fn state(token: &str) -> Option<String> {
    STATE_SPELLINGS
        .iter()
        .any(|spelling| token.contains(spelling))
        .then(|| STATE_CANONICAL.to_string())
}

fn pincode(token: &str) -> Option<String> {
    PINCODE_EXACT.is_match(token).then(|| token.to_string())
}

fn long_number(token: &str) -> Option<String> {
    (token.chars().count() >= 6 && is_all_digits(token)).then(|| token.to_string())
}

// The label width is fixed, so a token like "Pincode: 600113" yields whatever
// follows the tenth character rather than the digits alone.
fn labelled_pincode(token: &str) -> Option<String> {
    LABELLED_PINCODE
        .is_match(token)
        .then(|| token.chars().skip(PINCODE_LABEL_WIDTH).collect())
}

fn city(token: &str) -> Option<String> {
    CITY_BEFORE_STATE
        .captures(token)
        .map(|caps| caps[1].to_string())
}

fn company(token: &str) -> Option<String> {
    token
        .chars()
        .next()
        .filter(char::is_ascii_alphabetic)
        .map(|_| token.to_string())
}

fn address(token: &str) -> Option<String> {
    Some(token.replace([',', ';'], ""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn first_match(token: &str) -> (&'static str, String) {
        CASCADE
            .iter()
            .find_map(|rule| rule.apply(token).map(|value| (rule.name, value)))
            .unwrap()
    }

    #[test]
    fn test_phone_variants() {
        assert_eq!(first_match("+91 98765 43210"), ("phone", "+91 98765 43210".to_string()));
        assert_eq!(first_match("044-2345-6789"), ("phone", "044-2345-6789".to_string()));
        // digits without a dash are not a phone number
        assert_eq!(first_match("9876543210").0, "long-number");
        // dashes alone are not digits
        assert_eq!(first_match("---").0, "address");
    }

    #[test]
    fn test_email_is_lowercased() {
        assert_eq!(first_match("Jane@Acme.com"), ("email", "jane@acme.com".to_string()));
        // no ".com", falls through to company
        assert_eq!(first_match("jane@acme.org").0, "company");
    }

    #[test]
    fn test_website_needs_marker_and_com() {
        assert_eq!(first_match("WWW.Acme.com"), ("website", "www.acme.com".to_string()));
        assert_eq!(first_match("https://acme.com"), ("website", "https://acme.com".to_string()));
        // ".com" is checked on the raw token, so an uppercase suffix misses
        assert_eq!(first_match("www.ACME.COM").0, "company");
        assert_eq!(first_match("acme.com").0, "company");
    }

    #[test]
    fn test_state_discards_rest_of_token() {
        assert_eq!(first_match("Chennai, Tamil Nadu"), ("state", "TamilNadu".to_string()));
        assert_eq!(first_match("TamilNadu 600113"), ("state", "TamilNadu".to_string()));
    }

    #[test]
    fn test_pincode_rules() {
        assert_eq!(first_match("600001"), ("pincode", "600001".to_string()));
        assert_eq!(first_match("6000011"), ("long-number", "6000011".to_string()));
        assert_eq!(first_match("12345").0, "address");
    }

    #[test]
    fn test_labelled_pincode_uses_fixed_offset() {
        assert_eq!(
            first_match("Karnataka 560001"),
            ("labelled-pincode", "560001".to_string())
        );
        assert_eq!(
            first_match("Pincode: 600113"),
            ("company", "Pincode: 600113".to_string())
        );
        assert_eq!(
            first_match("Kerala, Ernakulam 682001"),
            ("labelled-pincode", "nakulam 682001".to_string())
        );
    }

    #[test]
    fn test_city_rule_is_shadowed_by_state() {
        let token = "123 ABC St. Salem TamilNadu";
        assert_eq!(city(token), Some("Salem".to_string()));
        assert_eq!(first_match(token).0, "state");
    }

    #[test]
    fn test_company_requires_ascii_letter() {
        assert_eq!(first_match("Acme Corp"), ("company", "Acme Corp".to_string()));
        assert_eq!(first_match("Éclair Ltd").0, "address");
    }

    #[test]
    fn test_address_strips_separators() {
        assert_eq!(first_match("123 ABC St.,"), ("address", "123 ABC St.".to_string()));
        assert_eq!(first_match("12; Main, Road"), ("address", "12 Main Road".to_string()));
        assert_eq!(first_match(""), ("address", String::new()));
    }

    #[test]
    fn test_last_rule_is_total() {
        let last = CASCADE.last().unwrap();
        assert_eq!(last.field, FieldName::Address);
        assert!(last.apply("?!").is_some());
    }
}
