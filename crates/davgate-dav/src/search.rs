//! DASL query text builders.
//!
//! Listings are SQL-like queries of the form
//! `SELECT ... FROM SCOPE('<mode> TRAVERSAL OF "<url>"') WHERE ...`.
//! Folder listings filter to non-hidden folder entries, item listings to
//! non-hidden non-folder entries; a compiled user condition, when
//! present, is ANDed onto the fixed filter.

use crate::condition::Condition;
use crate::error::Result;
use crate::fields::FieldRegistry;

/// Traversal mode of a scoped search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Traversal {
    /// Recurse into the whole subtree.
    Deep,
    /// List direct children only.
    Shallow,
}

impl Traversal {
    /// Returns the literal scope token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Deep => "DEEP",
            Self::Shallow => "SHALLOW",
        }
    }
}

/// Builds the folder-listing query for the given scope.
pub fn folder_listing(
    fields: &FieldRegistry,
    folder_url: &str,
    mode: Traversal,
    condition: Option<&Condition>,
) -> Result<String> {
    let mut query = format!(
        "Select \"DAV:nosubs\", \"DAV:hassubs\", \
         \"http://schemas.microsoft.com/exchange/outlookfolderclass\", \
         \"http://schemas.microsoft.com/repl/contenttag\", \
         \"http://schemas.microsoft.com/mapi/proptag/x30080040\", \
         \"urn:schemas:httpmail:unreadcount\" \
         FROM Scope('{} TRAVERSAL OF \"{}\"')\n \
         WHERE \"DAV:ishidden\" = False AND \"DAV:isfolder\" = True \n",
        mode.as_str(),
        folder_url
    );
    append_condition(&mut query, fields, condition)?;
    Ok(query)
}

/// Builds the item-listing query for the given folder.
///
/// The permanent URL is always selected; `attributes` adds further
/// aliased columns resolved through the field registry.
pub fn item_listing(
    fields: &FieldRegistry,
    folder_url: &str,
    attributes: &[&str],
    condition: Option<&Condition>,
) -> Result<String> {
    let mut query = String::from(
        "Select \"http://schemas.microsoft.com/exchange/permanenturl\" as permanenturl",
    );
    for attribute in attributes {
        let field = fields.lookup(attribute)?;
        query.push_str(",\"");
        query.push_str(&field.uri());
        query.push_str("\" as ");
        query.push_str(field.alias);
    }
    query.push_str(" FROM Scope('SHALLOW TRAVERSAL OF \"");
    query.push_str(folder_url);
    query.push_str("\"') WHERE \"DAV:ishidden\" = False AND \"DAV:isfolder\" = False");
    append_condition(&mut query, fields, condition)?;
    Ok(query)
}

fn append_condition(
    query: &mut String,
    fields: &FieldRegistry,
    condition: Option<&Condition>,
) -> Result<()> {
    if let Some(condition) = condition {
        let text = condition.compile(fields)?;
        if !text.is_empty() {
            query.push_str(" AND ");
            query.push_str(&text);
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::condition;

    #[test]
    fn folder_listing_shape() {
        let fields = FieldRegistry::new();
        let query =
            folder_listing(&fields, "/exchange/jdoe/", Traversal::Deep, None).unwrap();
        assert!(query.starts_with("Select \"DAV:nosubs\", \"DAV:hassubs\""));
        assert!(query.contains("FROM Scope('DEEP TRAVERSAL OF \"/exchange/jdoe/\"')"));
        assert!(query.contains("WHERE \"DAV:ishidden\" = False AND \"DAV:isfolder\" = True"));
    }

    #[test]
    fn folder_listing_shallow_mode() {
        let fields = FieldRegistry::new();
        let query =
            folder_listing(&fields, "/public/", Traversal::Shallow, None).unwrap();
        assert!(query.contains("'SHALLOW TRAVERSAL OF"));
    }

    #[test]
    fn item_listing_always_selects_permanenturl() {
        let fields = FieldRegistry::new();
        let query = item_listing(&fields, "/exchange/jdoe/INBOX/", &[], None).unwrap();
        assert!(query.starts_with(
            "Select \"http://schemas.microsoft.com/exchange/permanenturl\" as permanenturl"
        ));
        assert!(query.contains("WHERE \"DAV:ishidden\" = False AND \"DAV:isfolder\" = False"));
    }

    #[test]
    fn item_listing_adds_aliased_attributes() {
        let fields = FieldRegistry::new();
        let query =
            item_listing(&fields, "/exchange/jdoe/INBOX/", &["read", "uid"], None).unwrap();
        assert!(query.contains(",\"urn:schemas:httpmail:read\" as read"));
        assert!(query.contains(",\"DAV:uid\" as uid"));
    }

    #[test]
    fn user_condition_is_anded() {
        let fields = FieldRegistry::new();
        let cond = condition::eq("displayname", "a.EML");
        let query =
            item_listing(&fields, "/exchange/jdoe/INBOX/", &[], Some(&cond)).unwrap();
        assert!(query.ends_with(" AND \"DAV:displayname\" = 'a.EML'"));
    }

    #[test]
    fn empty_multi_condition_adds_nothing() {
        let fields = FieldRegistry::new();
        let cond = condition::and(vec![None]);
        let query =
            item_listing(&fields, "/exchange/jdoe/INBOX/", &[], Some(&cond)).unwrap();
        assert!(query.ends_with("\"DAV:isfolder\" = False"));
    }

    #[test]
    fn unknown_attribute_propagates() {
        let fields = FieldRegistry::new();
        assert!(item_listing(&fields, "/x/", &["bogus"], None).is_err());
    }
}
