use reqwest::Url;
use std::net::IpAddr;

pub fn parse_bool_str(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// True when the URL's host is `localhost`, a loopback address or the unspecified address.
pub fn is_local_endpoint_url(url: &str) -> bool {
    let parsed = match Url::parse(url.trim()) {
        Ok(parsed) => parsed,
        Err(_) => return false,
    };

    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    match host.parse::<IpAddr>() {
        Ok(ip) => ip.is_loopback() || ip.is_unspecified(),
        Err(_) => false,
    }
}

/// Joins a backend base URL and a route, tolerating a trailing slash on the base.
pub fn endpoint_url(base_url: &str, route: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let route = route.trim_start_matches('/');
    format!("{base}/{route}")
}
