//! Guards for values interpolated into URLs and SOAP envelopes.
//!
//! Record ids, sObject names and external id values come from job data, so
//! they are validated or encoded before they reach a request path.

/// sObject and field name validation.
pub mod names {
    /// Letters, digits and underscores, starting with a letter.
    /// Covers custom suffixes such as `__c`, `__r` and `__e`.
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Same rules as field names.
    #[must_use]
    pub fn is_safe_sobject_name(name: &str) -> bool {
        is_safe_field_name(name)
    }
}

/// URL path segment helpers.
pub mod url {
    /// Percent-encode a value used as a single path segment.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// 15 or 18 ASCII alphanumerics.
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        matches!(id.len(), 15 | 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}

/// XML text escaping for SOAP bodies.
pub mod xml {
    /// Escape `&`, `<`, `>`, quotes and apostrophes.
    #[must_use]
    pub fn escape(value: &str) -> String {
        let mut out = String::with_capacity(value.len());
        for ch in value.chars() {
            match ch {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                '\'' => out.push_str("&apos;"),
                _ => out.push(ch),
            }
        }
        out
    }

    /// Reverse of [`escape`] for the five predefined entities.
    #[must_use]
    pub fn unescape(value: &str) -> String {
        value
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert!(names::is_safe_field_name("Id"));
        assert!(names::is_safe_field_name("Custom_Field__c"));
        assert!(names::is_safe_sobject_name("vera__Beneficiary__c"));

        assert!(!names::is_safe_field_name(""));
        assert!(!names::is_safe_field_name("1Account"));
        assert!(!names::is_safe_field_name("Account/../User"));
        assert!(!names::is_safe_sobject_name("Account; DROP"));
    }

    #[test]
    fn test_encode_param() {
        assert_eq!(url::encode_param("EXT-001"), "EXT-001");
        assert_eq!(url::encode_param("a b/c"), "a%20b%2Fc");
    }

    #[test]
    fn test_salesforce_ids() {
        assert!(url::is_valid_salesforce_id("001000000000001"));
        assert!(url::is_valid_salesforce_id("001000000000001AAA"));
        assert!(!url::is_valid_salesforce_id("001"));
        assert!(!url::is_valid_salesforce_id("001/../../etc/pa"));
    }

    #[test]
    fn test_xml_escape_unescape() {
        let raw = r#"p&ss<w>rd"'"#;
        let escaped = xml::escape(raw);
        assert_eq!(escaped, "p&amp;ss&lt;w&gt;rd&quot;&apos;");
        assert_eq!(xml::unescape(&escaped), raw);
        assert_eq!(xml::unescape("&amp;lt;"), "&lt;");
    }
}
