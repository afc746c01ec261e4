//! Session bootstrap: mailbox root discovery and well-known folder
//! resolution.
//!
//! The post-login landing page is an HTML frameset whose `<base href>`
//! points into the user's mailbox. Scraping it is the only way to learn
//! the mailbox root on older servers; newer ones get the fixed
//! `/exchange/<email>/` layout as a failover.

use url::Url;

use super::{Mailbox, PUBLIC_ROOT, encode_path};
use crate::error::{Error, Result};
use crate::fields::{FieldRegistry, Namespace};
use crate::marshal::decode_href;
use crate::transport::Transport;

/// Case-insensitive marker scanned for in the landing page body.
const BASE_HREF: &str = "<base href=\"";

/// Aliases of the well-known folder URL properties, fetched in one
/// request against the mailbox root.
const WELL_KNOWN_FOLDERS: [&str; 8] = [
    "inbox",
    "deleteditems",
    "sentitems",
    "sendmsg",
    "drafts",
    "calendar",
    "contacts",
    "outbox",
];

/// Extracts the base href URL from the landing page body, scanning
/// line by line for the marker.
pub(crate) fn parse_base_href(body: &str) -> Option<String> {
    for line in body.lines() {
        let lower = line.to_ascii_lowercase();
        if let Some(pos) = lower.find(BASE_HREF) {
            let start = pos + BASE_HREF.len();
            let rest = &line[start..];
            if let Some(end) = rest.find('"') {
                return Some(rest[..end].to_string());
            }
        }
    }
    None
}

/// Derives the user email address from the authenticated context.
pub(crate) fn build_email(username: &str, host: &str) -> String {
    if username.contains('@') {
        username.to_string()
    } else {
        format!("{username}@{host}")
    }
}

/// Determines the email address and mailbox root path from the landing
/// page, with the fixed-layout failover when the marker is absent.
fn build_mail_path<T: Transport>(transport: &T, landing_body: &[u8]) -> Result<(String, String)> {
    let body = String::from_utf8_lossy(landing_body);
    let email = build_email(transport.username(), transport.host());

    let mail_path = match parse_base_href(&body) {
        Some(href) => {
            let base = Url::parse(&href)
                .map_err(|_| Error::Authentication(format!("invalid base href {href}")))?;
            let path = base.path().to_string();
            tracing::debug!(mail_path = %path, "base href found in body");
            path
        }
        None => {
            // failover: standard mailbox link built from the email
            let path = format!("/exchange/{email}/");
            tracing::debug!(email = %email, mail_path = %path, "no base href, using default layout");
            path
        }
    };

    if mail_path.is_empty() || email.is_empty() {
        return Err(Error::Authentication(
            "unable to determine mailbox root or email, password may be expired".to_string(),
        ));
    }
    Ok((email, mail_path))
}

/// Runs the full bootstrap sequence against the transport.
pub(crate) async fn bootstrap<T: Transport>(
    transport: &mut T,
    landing_body: &[u8],
    fields: &FieldRegistry,
) -> Result<Mailbox> {
    let (email, mail_path) = build_mail_path(transport, landing_body)?;
    tracing::debug!(email = %email, "current user email");

    let mut props = Vec::with_capacity(WELL_KNOWN_FOLDERS.len());
    for alias in WELL_KNOWN_FOLDERS {
        props.push(fields.lookup(alias)?);
    }
    let response = transport
        .propfind(&encode_path(&mail_path), 0, &props)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, mail_path = %mail_path, "well-known folder discovery failed");
            Error::MailboxDiscovery(mail_path.clone())
        })?;
    let Some(entry) = response.first() else {
        return Err(Error::MailboxDiscovery(mail_path));
    };

    let url_of = |alias: &str| {
        entry
            .props
            .get(Namespace::HttpMail, alias)
            .map(decode_href)
    };
    let inbox_url = url_of("inbox");
    let trash_url = url_of("deleteditems");
    let sent_url = url_of("sentitems");
    let sendmsg_url = url_of("sendmsg");
    let drafts_url = url_of("drafts");
    let calendar_url = url_of("calendar");
    let contacts_url = url_of("contacts");
    let outbox_url = url_of("outbox");
    // junk folder not available over webdav

    let public_url = probe_public_root(transport, fields, inbox_url.as_deref()).await?;

    tracing::debug!(
        inbox = ?inbox_url,
        trash = ?trash_url,
        sent = ?sent_url,
        sendmsg = ?sendmsg_url,
        drafts = ?drafts_url,
        calendar = ?calendar_url,
        contacts = ?contacts_url,
        outbox = ?outbox_url,
        public = %public_url,
        "well-known folders resolved"
    );

    Ok(Mailbox {
        email,
        mail_path,
        inbox_url,
        trash_url,
        sent_url,
        sendmsg_url,
        drafts_url,
        calendar_url,
        contacts_url,
        outbox_url,
        public_url,
    })
}

/// Resolves and probes the public-folder root.
///
/// Failure is non-fatal: public folders become unavailable and the
/// default path is kept. The probe may enable the transport's fallback
/// authentication mode, at most once.
async fn probe_public_root<T: Transport>(
    transport: &mut T,
    fields: &FieldRegistry,
    inbox_url: Option<&str>,
) -> Result<String> {
    let mut public_url = PUBLIC_ROOT.to_string();
    if let Some(inbox) = inbox_url
        && let Ok(mut uri) = Url::parse(inbox)
    {
        // carry the inbox authority over to the public root
        uri.set_path(PUBLIC_ROOT);
        public_url = uri.to_string();
    }

    let content_class = fields.lookup("contentclass")?;
    let reachable = match transport
        .propfind(&encode_path(&public_url), 0, &[content_class])
        .await
    {
        Ok(_) => true,
        Err(_) if !transport.has_fallback_auth() => {
            // workaround: some servers require the alternate
            // authentication mode on /public only
            transport.enable_fallback_auth();
            transport
                .propfind(&encode_path(&public_url), 0, &[content_class])
                .await
                .is_ok()
        }
        Err(_) => false,
    };

    if !reachable {
        tracing::warn!(public_url = %public_url, "public folders not available");
        public_url = PUBLIC_ROOT.to_string();
    }
    Ok(public_url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn base_href_extracted_case_insensitively() {
        let body = "<html>\n<BASE HREF=\"https://mail.example.com/exchange/jdoe/\">\n</html>";
        assert_eq!(
            parse_base_href(body).as_deref(),
            Some("https://mail.example.com/exchange/jdoe/")
        );
    }

    #[test]
    fn base_href_absent() {
        assert!(parse_base_href("<html><body>login ok</body></html>").is_none());
    }

    #[test]
    fn base_href_takes_first_line_match() {
        let body = "<base href=\"https://a/one/\">\n<base href=\"https://a/two/\">";
        assert_eq!(parse_base_href(body).as_deref(), Some("https://a/one/"));
    }

    #[test]
    fn email_from_plain_user() {
        assert_eq!(build_email("jdoe", "mail.example.com"), "jdoe@mail.example.com");
    }

    #[test]
    fn email_passthrough_when_already_qualified() {
        assert_eq!(
            build_email("jdoe@corp.example.com", "mail.example.com"),
            "jdoe@corp.example.com"
        );
    }
}
