//! Netscape cookie file format (curl/wget compatible).
//!
//! Each line has the format:
//! `domain\tinclude_subdomains\tpath\tsecure\texpiry\tname\tvalue`
//!
//! A `#HttpOnly_` prefix on the domain marks an HttpOnly cookie; any other
//! line starting with `#` is a comment.

use crate::base::profileerror::ProfileError;
use crate::cookies::definition::CookieDefinition;

const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Export profile cookies to Netscape cookie format.
pub fn export_netscape(cookies: &[CookieDefinition]) -> String {
    let mut lines = vec![
        "# Netscape HTTP Cookie File".to_string(),
        "# https://curl.se/docs/http-cookies.html".to_string(),
        "# This file was generated by cookieprofiles".to_string(),
        String::new(),
    ];

    for cookie in cookies {
        let host_only = cookie.host_only.unwrap_or(false);
        let include_subdomains = if host_only { "FALSE" } else { "TRUE" };
        let secure = if cookie.secure { "TRUE" } else { "FALSE" };
        let expiry = cookie
            .expiration_time()
            .map(|t| t.unix_timestamp())
            .unwrap_or(0);

        // Domain should start with . for non-host-only cookies
        let domain = if !host_only && !cookie.domain.starts_with('.') {
            format!(".{}", cookie.domain)
        } else {
            cookie.domain.clone()
        };
        let domain = if cookie.http_only {
            format!("{}{}", HTTP_ONLY_PREFIX, domain)
        } else {
            domain
        };

        lines.push(format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            domain, include_subdomains, cookie.path, secure, expiry, cookie.name, cookie.value
        ));
    }

    lines.join("\n")
}

/// Import cookies from Netscape format content.
///
/// Lines with fewer than seven fields or a non-numeric expiry are errors.
/// An expiry of `0` marks a session cookie.
pub fn import_netscape(content: &str) -> Result<Vec<CookieDefinition>, ProfileError> {
    let mut cookies = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line_no = idx + 1;

        let (line, http_only) = match line.strip_prefix(HTTP_ONLY_PREFIX) {
            Some(rest) => (rest, true),
            None => (line, false),
        };

        // Skip comments and empty lines
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() < 7 {
            return Err(ProfileError::InvalidNetscapeLine { line: line_no });
        }

        let host_only = parts[1].eq_ignore_ascii_case("FALSE");
        let expiry: i64 = parts[4]
            .trim()
            .parse()
            .map_err(|_| ProfileError::InvalidNetscapeLine { line: line_no })?;

        let mut cookie = CookieDefinition::new(parts[5], parts[6], parts[0])
            .with_path(parts[2])
            .with_secure(parts[3].eq_ignore_ascii_case("TRUE"))
            .with_http_only(http_only);
        cookie.host_only = Some(host_only);
        if expiry > 0 {
            cookie.expiration_date = Some(expiry as f64);
        } else {
            cookie.session = Some(true);
        }

        cookies.push(cookie);
    }

    Ok(cookies)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_basic() {
        let cookies = vec![CookieDefinition::new("session", "abc", "example.com")
            .with_secure(true)
            .with_expiration(1735689600.0)];

        let netscape = export_netscape(&cookies);
        assert!(netscape.starts_with("# Netscape HTTP Cookie File"));
        assert!(netscape.contains(".example.com\tTRUE\t/\tTRUE\t1735689600\tsession\tabc"));
    }

    #[test]
    fn test_export_http_only_prefix() {
        let cookies = vec![CookieDefinition::new("sid", "1", ".example.com").with_http_only(true)];
        let netscape = export_netscape(&cookies);
        assert!(netscape.contains("#HttpOnly_.example.com\tTRUE"));
    }

    #[test]
    fn test_import_basic() {
        let content = "# Netscape HTTP Cookie File\n\
.example.com\tTRUE\t/\tTRUE\t1735689600\tsession\tabc123\n\
test.com\tFALSE\t/path\tFALSE\t0\tuser\tjohn\n\
#HttpOnly_.example.com\tTRUE\t/\tFALSE\t0\tsid\tx\n";

        let cookies = import_netscape(content).unwrap();
        assert_eq!(cookies.len(), 3);

        assert_eq!(cookies[0].name, "session");
        assert_eq!(cookies[0].domain, ".example.com");
        assert!(cookies[0].secure);
        assert_eq!(cookies[0].expiration_date, Some(1735689600.0));

        assert_eq!(cookies[1].host_only, Some(true));
        assert_eq!(cookies[1].path, "/path");
        assert_eq!(cookies[1].session, Some(true));

        assert!(cookies[2].http_only);
    }

    #[test]
    fn test_import_rejects_short_line() {
        let err = import_netscape("# header\n.example.com\tTRUE\t/\n").unwrap_err();
        assert!(matches!(err, ProfileError::InvalidNetscapeLine { line: 2 }));
    }

    #[test]
    fn test_import_rejects_bad_expiry() {
        let err = import_netscape(".example.com\tTRUE\t/\tFALSE\tsoon\tname\tvalue").unwrap_err();
        assert!(matches!(err, ProfileError::InvalidNetscapeLine { line: 1 }));
    }

    #[test]
    fn test_export_then_import_keeps_cookies() {
        let cookies = vec![
            CookieDefinition::new("a", "1", ".example.com").with_expiration(1893456000.0),
            CookieDefinition::new("b", "2", ".example.com").with_path("/app"),
        ];

        let imported = import_netscape(&export_netscape(&cookies)).unwrap();
        let names: Vec<_> = imported.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(imported[1].path, "/app");
    }
}
