//! Query construction for the upstream graph API.
//!
//! Queries are assembled as a small selection tree and serialized once, so
//! every string argument passes through [`string_literal`]. Identifiers,
//! course codes and search text are caller-controlled; they must never be
//! able to terminate a literal early and inject query structure.

use std::fmt::Write;

/// Default number of ratings requested per professor.
pub const DEFAULT_RATING_LIMIT: u32 = 25;

const RATING_FIELDS: &[&str] = &["comment", "helpfulRating", "difficultyRating", "clarityRating"];

const DETAIL_FIELDS: &[&str] = &[
    "id",
    "firstName",
    "lastName",
    "avgRating",
    "avgDifficulty",
    "wouldTakeAgainPercent",
];

const BASIC_FIELDS: &[&str] = &["firstName", "lastName"];

const SEARCH_HIT_FIELDS: &[&str] = &["id", "firstName", "lastName", "department"];

/// Argument value inside a field call.
#[derive(Debug, Clone)]
enum Arg {
    Str(String),
    Int(u32),
    Object(Vec<(&'static str, Arg)>),
}

#[derive(Debug, Clone)]
enum Selection {
    Field(Field),
    /// `... on Type { ... }`
    OnType(&'static str, Vec<Selection>),
}

#[derive(Debug, Clone)]
struct Field {
    alias: Option<String>,
    name: &'static str,
    args: Vec<(&'static str, Arg)>,
    selection: Vec<Selection>,
}

impl Field {
    fn new(name: &'static str) -> Self {
        Self {
            alias: None,
            name,
            args: Vec::new(),
            selection: Vec::new(),
        }
    }

    fn alias(mut self, alias: String) -> Self {
        self.alias = Some(alias);
        self
    }

    fn arg(mut self, name: &'static str, value: Arg) -> Self {
        self.args.push((name, value));
        self
    }

    fn select(mut self, selection: Selection) -> Self {
        self.selection.push(selection);
        self
    }

    fn scalars(mut self, names: &[&'static str]) -> Self {
        self.selection
            .extend(names.iter().map(|n| Selection::Field(Field::new(*n))));
        self
    }

    fn write(&self, out: &mut String) {
        if let Some(alias) = &self.alias {
            let _ = write!(out, "{alias}: ");
        }
        out.push_str(self.name);

        if !self.args.is_empty() {
            out.push('(');
            write_args(&self.args, out);
            out.push(')');
        }

        if !self.selection.is_empty() {
            out.push(' ');
            write_selection(&self.selection, out);
        }
    }
}

fn write_args(args: &[(&'static str, Arg)], out: &mut String) {
    for (i, (name, value)) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{name}: ");
        value.write(out);
    }
}

impl Arg {
    fn write(&self, out: &mut String) {
        match self {
            Arg::Str(s) => out.push_str(&string_literal(s)),
            Arg::Int(n) => {
                let _ = write!(out, "{n}");
            }
            Arg::Object(fields) => {
                out.push_str("{ ");
                write_args(fields, out);
                out.push_str(" }");
            }
        }
    }
}

fn write_selection(selection: &[Selection], out: &mut String) {
    out.push_str("{ ");
    for item in selection {
        match item {
            Selection::Field(field) => field.write(out),
            Selection::OnType(type_name, inner) => {
                let _ = write!(out, "... on {type_name} ");
                write_selection(inner, out);
            }
        }
        out.push(' ');
    }
    out.push('}');
}

/// Top-level `query { ... }` over the given root fields.
fn document(fields: Vec<Field>) -> String {
    let mut out = String::from("query ");
    let selection: Vec<Selection> = fields.into_iter().map(Selection::Field).collect();
    write_selection(&selection, &mut out);
    out
}

/// Quoted, escaped string literal. JSON string syntax is a subset of the
/// graph query language's, so serde_json's escaping is reused verbatim.
pub fn string_literal(s: &str) -> String {
    serde_json::Value::String(s.to_owned()).to_string()
}

/// Positional alias correlating a batched sub-request with its response.
pub fn alias(index: usize) -> String {
    format!("p{index}")
}

fn teacher_node(id: &str, fields: Selection) -> Field {
    Field::new("node")
        .arg("id", Arg::Str(id.to_owned()))
        .select(fields)
}

fn detail_fields(rating_limit: u32, course_filter: Option<&str>) -> Selection {
    let mut ratings = Field::new("ratings").arg("first", Arg::Int(rating_limit));
    if let Some(course) = course_filter {
        ratings = ratings.arg("courseFilter", Arg::Str(course.to_owned()));
    }
    let ratings = ratings.select(Selection::Field(
        Field::new("edges").select(Selection::Field(Field::new("node").scalars(RATING_FIELDS))),
    ));

    let mut fields: Vec<Selection> = DETAIL_FIELDS
        .iter()
        .map(|n| Selection::Field(Field::new(*n)))
        .collect();
    fields.push(Selection::Field(ratings));

    Selection::OnType("Teacher", fields)
}

fn basic_fields() -> Selection {
    Selection::OnType(
        "Teacher",
        BASIC_FIELDS
            .iter()
            .map(|n| Selection::Field(Field::new(*n)))
            .collect(),
    )
}

/// Detail lookup for one professor. With a course filter only ratings for
/// that course are requested; otherwise the `rating_limit` most recent.
pub fn build_single_query(id: &str, course_filter: Option<&str>, rating_limit: u32) -> String {
    document(vec![teacher_node(
        id,
        detail_fields(rating_limit, course_filter),
    )])
}

/// Name-only lookup for several professors, aliased `p0`, `p1`, ...
pub fn build_multi_basic_query<S: AsRef<str>>(ids: &[S]) -> String {
    document(
        ids.iter()
            .enumerate()
            .map(|(i, id)| teacher_node(id.as_ref(), basic_fields()).alias(alias(i)))
            .collect(),
    )
}

/// Full detail lookup for several professors, aliased `p0`, `p1`, ...
pub fn build_multi_detail_query<S: AsRef<str>>(ids: &[S], rating_limit: u32) -> String {
    document(
        ids.iter()
            .enumerate()
            .map(|(i, id)| {
                teacher_node(id.as_ref(), detail_fields(rating_limit, None)).alias(alias(i))
            })
            .collect(),
    )
}

/// Best-match professor search for several names within one school.
pub fn build_multi_search_query<S: AsRef<str>>(names: &[S], school_id: &str) -> String {
    document(
        names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let teachers = Field::new("teachers")
                    .arg(
                        "query",
                        Arg::Object(vec![
                            ("text", Arg::Str(name.as_ref().to_owned())),
                            ("schoolID", Arg::Str(school_id.to_owned())),
                        ]),
                    )
                    .arg("first", Arg::Int(1))
                    .select(Selection::Field(Field::new("edges").select(
                        Selection::Field(Field::new("node").scalars(SEARCH_HIT_FIELDS)),
                    )));

                Field::new("newSearch")
                    .alias(alias(i))
                    .select(Selection::Field(teachers))
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reads the string literal starting at `text[start]` the way a query
    /// parser would: honours backslash escapes, stops at the first bare quote.
    /// Returns the unescaped value and the byte offset just past the literal.
    fn read_literal(text: &str, start: usize) -> (String, usize) {
        let bytes = text.as_bytes();
        assert_eq!(bytes[start], b'"');
        let mut value = String::new();
        let mut chars = text[start + 1..].char_indices();

        while let Some((offset, c)) = chars.next() {
            match c {
                '"' => return (value, start + 1 + offset + 1),
                '\\' => {
                    let (_, escaped) = chars.next().expect("dangling escape");
                    match escaped {
                        'n' => value.push('\n'),
                        't' => value.push('\t'),
                        'r' => value.push('\r'),
                        'u' => {
                            let hex: String = (0..4).filter_map(|_| chars.next()).map(|(_, h)| h).collect();
                            let code = u32::from_str_radix(&hex, 16).unwrap();
                            value.push(char::from_u32(code).unwrap());
                        }
                        other => value.push(other),
                    }
                }
                other => value.push(other),
            }
        }
        panic!("unterminated literal");
    }

    fn literal_after(query: &str, marker: &str) -> (String, String) {
        let start = query.find(marker).expect("marker present") + marker.len();
        let (value, end) = read_literal(query, start);
        (value, query[end..].to_string())
    }

    #[test]
    fn test_single_query_with_course_filter() {
        let q = build_single_query("VGVhY2hlci0x", Some("CSI2110"), 25);

        assert!(q.starts_with("query { node(id: \"VGVhY2hlci0x\")"));
        assert!(q.contains("... on Teacher"));
        assert!(q.contains("ratings(first: 25, courseFilter: \"CSI2110\")"));
        assert!(q.contains("wouldTakeAgainPercent"));
        assert!(q.contains("edges { node { comment helpfulRating difficultyRating clarityRating } }"));
    }

    #[test]
    fn test_single_query_without_course_filter() {
        let q = build_single_query("abc", None, 10);

        assert!(q.contains("ratings(first: 10)"));
        assert!(!q.contains("courseFilter"));
    }

    #[test]
    fn test_braces_balanced() {
        for q in [
            build_single_query("a", Some("b"), 25),
            build_multi_basic_query(&["a", "b"]),
            build_multi_detail_query(&["a", "b", "c"], 5),
            build_multi_search_query(&["Ada"], "U2Nob29sLTE0NTI="),
        ] {
            let open = q.matches('{').count();
            let close = q.matches('}').count();
            assert_eq!(open, close, "unbalanced: {q}");
        }
    }

    #[test]
    fn test_multi_basic_query_aliases_in_order() {
        let q = build_multi_basic_query(&["a", "b", "c"]);

        let p0 = q.find("p0: node(id: \"a\")").unwrap();
        let p1 = q.find("p1: node(id: \"b\")").unwrap();
        let p2 = q.find("p2: node(id: \"c\")").unwrap();
        assert!(p0 < p1 && p1 < p2);
        assert!(q.contains("... on Teacher { firstName lastName }"));
        assert!(!q.contains("ratings"));
    }

    #[test]
    fn test_multi_detail_query_requests_ratings() {
        let q = build_multi_detail_query(&["x", "y"], 25);

        assert_eq!(q.matches("ratings(first: 25)").count(), 2);
        assert!(q.contains("p1: node(id: \"y\")"));
    }

    #[test]
    fn test_search_query_shape() {
        let q = build_multi_search_query(&["Ada Lovelace"], "U2Nob29sLTE0NTI=");

        assert!(q.contains(
            "p0: newSearch { teachers(query: { text: \"Ada Lovelace\", schoolID: \"U2Nob29sLTE0NTI=\" }, first: 1)"
        ));
        assert!(q.contains("node { id firstName lastName department }"));
    }

    #[test]
    fn test_quote_in_id_stays_inside_literal() {
        let id = "abc\") { __typename } x: node(id: \"";
        let q = build_single_query(id, None, 25);

        let (value, rest) = literal_after(&q, "node(id: ");
        assert_eq!(value, id);
        assert!(rest.starts_with(") { ... on Teacher"));
    }

    #[test]
    fn test_control_characters_in_course_escaped() {
        let course = "CSI\n2110\t\"\\\u{1}";
        let q = build_single_query("id", Some(course), 25);

        assert!(!q.contains('\n'));
        let (value, rest) = literal_after(&q, "courseFilter: ");
        assert_eq!(value, course);
        assert!(rest.starts_with(") { edges"));
    }

    #[test]
    fn test_quote_in_batched_id_stays_inside_literal() {
        let ids = ["ok", "evil\"id", "fine"];
        let q = build_multi_detail_query(&ids, 25);

        let (value, _) = literal_after(&q, "p1: node(id: ");
        assert_eq!(value, "evil\"id");
        assert!(q.contains("p2: node(id: \"fine\")"));
    }

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("plain"), "\"plain\"");
        assert_eq!(string_literal("a\"b"), "\"a\\\"b\"");
        assert_eq!(string_literal("a\\b"), "\"a\\\\b\"");
    }
}
