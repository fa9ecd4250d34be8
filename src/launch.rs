//! The launch context: where the one-time redemption ticket comes from.
//!
//! The chat host opens the mini-app with a URL such as
//! `https://guide.example/app?ticket=<uuid>`. The ticket is read once and never
//! changes for the lifetime of the process.

use reqwest::Url;

pub const TICKET_PARAM: &str = "ticket";
const TICKET_FLAG: &str = "--ticket";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchContext {
    ticket: Option<String>,
}

impl LaunchContext {
    pub fn new(ticket: Option<String>) -> Self {
        let ticket = ticket
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        Self { ticket }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads the first `ticket` query parameter. Empty values count as absent.
    pub fn from_url(url: &str) -> Self {
        let ticket = Url::parse(url.trim()).ok().and_then(|u| {
            u.query_pairs()
                .find(|(key, _)| key == TICKET_PARAM)
                .map(|(_, value)| value.into_owned())
        });
        Self::new(ticket)
    }

    /// Scans launch arguments (without the program name) for a ticket.
    ///
    /// Accepts `--ticket=<value>`, `--ticket <value>`, or a launch URL carrying
    /// a `ticket` query parameter. The first match wins.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref().trim();

            if let Some(value) = arg
                .strip_prefix(TICKET_FLAG)
                .and_then(|rest| rest.strip_prefix('='))
            {
                let ctx = Self::new(Some(value.to_string()));
                if ctx.ticket.is_some() {
                    return ctx;
                }
                continue;
            }

            if arg == TICKET_FLAG {
                let ctx = Self::new(args.next().map(|v| v.as_ref().to_string()));
                if ctx.ticket.is_some() {
                    return ctx;
                }
                continue;
            }

            if arg.contains("://") {
                let ctx = Self::from_url(arg);
                if ctx.ticket.is_some() {
                    return ctx;
                }
            }
        }
        Self::empty()
    }

    pub fn ticket(&self) -> Option<&str> {
        self.ticket.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_url_reads_ticket_query_parameter() {
        let ctx = LaunchContext::from_url(
            "https://guide.example/app?lang=en&ticket=6f1c2a4e-93d1-4a57-9a0e-1b7d2e4f3c10",
        );
        assert_eq!(ctx.ticket(), Some("6f1c2a4e-93d1-4a57-9a0e-1b7d2e4f3c10"));
    }

    #[test]
    fn from_url_decodes_and_takes_first_value() {
        let ctx = LaunchContext::from_url("https://guide.example/?ticket=a%2Fb&ticket=second");
        assert_eq!(ctx.ticket(), Some("a/b"));
    }

    #[test]
    fn from_url_treats_missing_empty_or_invalid_as_absent() {
        assert_eq!(LaunchContext::from_url("https://guide.example/app").ticket(), None);
        assert_eq!(LaunchContext::from_url("https://guide.example/?ticket=").ticket(), None);
        assert_eq!(LaunchContext::from_url("not a url").ticket(), None);
    }

    #[test]
    fn from_args_accepts_flags_and_urls() {
        assert_eq!(LaunchContext::from_args(["--ticket=t-1"]).ticket(), Some("t-1"));
        assert_eq!(
            LaunchContext::from_args(["--verbose", "--ticket", "t-2"]).ticket(),
            Some("t-2")
        );
        assert_eq!(
            LaunchContext::from_args(["audioguide://open?ticket=t-3"]).ticket(),
            Some("t-3")
        );
    }

    #[test]
    fn from_args_skips_empty_values_and_returns_empty_without_ticket() {
        assert_eq!(
            LaunchContext::from_args(["--ticket=", "--ticket=t-4"]).ticket(),
            Some("t-4")
        );
        assert_eq!(LaunchContext::from_args(["--ticket"]).ticket(), None);
        assert_eq!(
            LaunchContext::from_args(Vec::<String>::new()),
            LaunchContext::empty()
        );
    }
}
