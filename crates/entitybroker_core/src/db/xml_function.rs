//! `xml_value(document, path)` SQL function.

use crate::model::XmlPath;
use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;

/// Registers `xml_value`, returning the text `path` selects in `document`,
/// or NULL when the document is NULL, malformed or has no match.
pub(crate) fn register_xml_functions(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "xml_value",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let document: Option<String> = ctx.get(0)?;
            let path: String = ctx.get(1)?;
            let path = XmlPath::parse(&path)
                .map_err(|err| rusqlite::Error::UserFunctionError(Box::new(err)))?;
            Ok(document.and_then(|text| path.evaluate(&text).ok().flatten()))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::register_xml_functions;
    use rusqlite::Connection;

    #[test]
    fn xml_value_selects_text_and_tolerates_bad_documents() {
        let conn = Connection::open_in_memory().unwrap();
        register_xml_functions(&conn).unwrap();

        let modality: Option<String> = conn
            .query_row(
                "SELECT xml_value('<H><S M=\"MR\"/></H>', '/H/S/@M')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(modality.as_deref(), Some("MR"));

        let malformed: Option<String> = conn
            .query_row("SELECT xml_value('<H>', '/H')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(malformed, None);

        let bad_path = conn.query_row("SELECT xml_value('<H/>', 'H')", [], |row| {
            row.get::<_, Option<String>>(0)
        });
        assert!(bad_path.is_err());
    }
}
