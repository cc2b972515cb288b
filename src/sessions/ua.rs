use lazy_static::lazy_static;
use regex::Regex;

/// Device/browser/OS fields parsed out of a User-Agent string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedUserAgent {
    pub device_name: Option<String>,
    pub browser_name: Option<String>,
    pub browser_version: Option<String>,
    pub operating_system: Option<String>,
    pub device_type: Option<String>,
}

lazy_static! {
    static ref BROWSER_RE: Regex =
        Regex::new(r"(Edg|OPR|Firefox|CriOS|Chrome|Version)/([0-9][0-9.]*)").unwrap();
}

pub fn parse(user_agent: &str) -> ParsedUserAgent {
    let ua = user_agent.trim();
    if ua.is_empty() {
        return ParsedUserAgent::default();
    }
    let lower = ua.to_lowercase();

    let (browser_name, browser_version) = browser(ua, &lower);
    let operating_system = operating_system(&lower);
    let device_type = device_type(&lower);
    let device_name = device_name(&lower, operating_system.as_deref());

    ParsedUserAgent {
        device_name,
        browser_name,
        browser_version,
        operating_system,
        device_type,
    }
}

fn browser(ua: &str, lower: &str) -> (Option<String>, Option<String>) {
    let found: Vec<(&str, &str)> = BROWSER_RE
        .captures_iter(ua)
        .filter_map(|c| Some((c.get(1)?.as_str(), c.get(2)?.as_str())))
        .collect();

    // Most UAs carry several product tokens (Edge and Opera both ship a
    // Chrome token), so the most specific token wins.
    for token in ["Edg", "OPR", "Firefox", "CriOS", "Chrome", "Version"] {
        let Some((_, version)) = found.iter().find(|(t, _)| *t == token) else {
            continue;
        };
        let name = match token {
            "Edg" => "Edge",
            "OPR" => "Opera",
            "Firefox" => "Firefox",
            // Chrome on iOS identifies itself as CriOS.
            "CriOS" | "Chrome" => "Chrome",
            "Version" if lower.contains("safari") => "Safari",
            _ => continue,
        };
        return (Some(name.to_owned()), Some((*version).to_owned()));
    }

    (None, None)
}

fn operating_system(lower: &str) -> Option<String> {
    let os = if lower.contains("windows nt") {
        "Windows"
    } else if lower.contains("iphone") || lower.contains("ipad") {
        "iOS"
    } else if lower.contains("mac os x") || lower.contains("macintosh") {
        "macOS"
    } else if lower.contains("android") {
        "Android"
    } else if lower.contains("linux") {
        "Linux"
    } else {
        return None;
    };
    Some(os.to_owned())
}

fn device_type(lower: &str) -> Option<String> {
    let kind = if lower.contains("ipad") || lower.contains("tablet") {
        "tablet"
    } else if lower.contains("mobi") || lower.contains("iphone") {
        "mobile"
    } else if lower.contains("android") {
        // Android UAs without the Mobile token are tablets by convention.
        "tablet"
    } else {
        "desktop"
    };
    Some(kind.to_owned())
}

fn device_name(lower: &str, os: Option<&str>) -> Option<String> {
    if lower.contains("iphone") {
        return Some("iPhone".to_owned());
    }
    if lower.contains("ipad") {
        return Some("iPad".to_owned());
    }
    match os {
        Some("Windows") => Some("Windows PC".to_owned()),
        Some("macOS") => Some("Mac".to_owned()),
        Some("Android") => Some("Android device".to_owned()),
        Some("Linux") => Some("Linux PC".to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHROME_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                              (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
    const FIREFOX_LINUX: &str =
        "Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0";
    const SAFARI_IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) \
                                 AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 \
                                 Mobile/15E148 Safari/604.1";
    const EDGE_WIN: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                            (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.2210.91";

    #[test]
    fn parses_chrome_on_windows() {
        let parsed = parse(CHROME_WIN);
        assert_eq!(parsed.browser_name.as_deref(), Some("Chrome"));
        assert_eq!(parsed.browser_version.as_deref(), Some("120.0.0.0"));
        assert_eq!(parsed.operating_system.as_deref(), Some("Windows"));
        assert_eq!(parsed.device_type.as_deref(), Some("desktop"));
        assert_eq!(parsed.device_name.as_deref(), Some("Windows PC"));
    }

    #[test]
    fn parses_firefox_on_linux() {
        let parsed = parse(FIREFOX_LINUX);
        assert_eq!(parsed.browser_name.as_deref(), Some("Firefox"));
        assert_eq!(parsed.browser_version.as_deref(), Some("121.0"));
        assert_eq!(parsed.operating_system.as_deref(), Some("Linux"));
        assert_eq!(parsed.device_type.as_deref(), Some("desktop"));
    }

    #[test]
    fn parses_safari_on_iphone() {
        let parsed = parse(SAFARI_IPHONE);
        assert_eq!(parsed.browser_name.as_deref(), Some("Safari"));
        assert_eq!(parsed.operating_system.as_deref(), Some("iOS"));
        assert_eq!(parsed.device_type.as_deref(), Some("mobile"));
        assert_eq!(parsed.device_name.as_deref(), Some("iPhone"));
    }

    #[test]
    fn edge_wins_over_its_chrome_token() {
        let parsed = parse(EDGE_WIN);
        assert_eq!(parsed.browser_name.as_deref(), Some("Edge"));
    }

    #[test]
    fn empty_agent_yields_nothing() {
        assert_eq!(parse(""), ParsedUserAgent::default());
    }
}
