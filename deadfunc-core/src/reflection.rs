//! Allow-list of reflection-consuming library functions.
//!
//! Passing a value to `encoding/json.Marshal` as `any` does not make every
//! exported method of its type callable; the marshaller only ever looks for
//! `MarshalJSON`/`MarshalText`. This database maps each such known consumer
//! to the method names it actually invokes, so conversions in their call
//! context mark exactly those methods instead of the whole exported surface.
//!
//! Unknown reflection consumers get no entry and fall back to the
//! conservative mark-all-exported behavior.

use rustc_hash::FxHashMap;

/// Methods a reflection consumer may invoke even without a matching
/// allow-list context; the common marshalling and formatting hooks.
pub const FALLBACK_REFLECTION_METHODS: &[&str] = &[
    "MarshalJSON",
    "UnmarshalJSON",
    "MarshalText",
    "UnmarshalText",
    "String",
    "GoString",
    "Error",
    "Format",
];

/// Database of reflection-consuming functions and the methods they call.
/// Keys are fully qualified function renderings, e.g. `fmt.Printf` or
/// `(*encoding/json.Encoder).Encode`.
#[derive(Debug, Clone, Default)]
pub struct ReflectionAllowlist {
    by_function: FxHashMap<String, Vec<String>>,
}

impl ReflectionAllowlist {
    /// An empty database; every consumer falls back to conservative
    /// marking.
    pub fn empty() -> Self {
        Self {
            by_function: FxHashMap::default(),
        }
    }

    /// The established defaults: JSON, XML, YAML, the fmt family, gob,
    /// binary, and SQL row materialization.
    pub fn with_defaults() -> Self {
        let mut db = Self::empty();

        // JSON encoding/decoding.
        db.add("encoding/json.Marshal", &["MarshalJSON", "MarshalText"]);
        db.add("encoding/json.MarshalIndent", &["MarshalJSON", "MarshalText"]);
        db.add("encoding/json.Unmarshal", &["UnmarshalJSON", "UnmarshalText"]);
        db.add("(*encoding/json.Encoder).Encode", &["MarshalJSON", "MarshalText"]);
        db.add("(*encoding/json.Decoder).Decode", &["UnmarshalJSON", "UnmarshalText"]);

        // Formatted printing calls Format; the plain family does not.
        db.add("fmt.Printf", &["String", "GoString", "Error", "Format"]);
        db.add("fmt.Sprintf", &["String", "GoString", "Error", "Format"]);
        db.add("fmt.Fprintf", &["String", "GoString", "Error", "Format"]);
        db.add("fmt.Errorf", &["String", "GoString", "Error", "Format"]);
        db.add("fmt.Print", &["String", "GoString", "Error"]);
        db.add("fmt.Sprint", &["String", "GoString", "Error"]);
        db.add("fmt.Fprint", &["String", "GoString", "Error"]);
        db.add("fmt.Println", &["String", "GoString", "Error"]);
        db.add("fmt.Sprintln", &["String", "GoString", "Error"]);
        db.add("fmt.Fprintln", &["String", "GoString", "Error"]);

        // XML encoding/decoding.
        db.add("encoding/xml.Marshal", &["MarshalXML", "MarshalXMLAttr"]);
        db.add("encoding/xml.MarshalIndent", &["MarshalXML", "MarshalXMLAttr"]);
        db.add("encoding/xml.Unmarshal", &["UnmarshalXML", "UnmarshalXMLAttr"]);
        db.add("(*encoding/xml.Encoder).Encode", &["MarshalXML", "MarshalXMLAttr"]);
        db.add("(*encoding/xml.Decoder).Decode", &["UnmarshalXML", "UnmarshalXMLAttr"]);

        // YAML (common third-party).
        db.add("gopkg.in/yaml.v3.Marshal", &["MarshalYAML"]);
        db.add("gopkg.in/yaml.v3.Unmarshal", &["UnmarshalYAML"]);
        db.add("gopkg.in/yaml.v2.Marshal", &["MarshalYAML"]);
        db.add("gopkg.in/yaml.v2.Unmarshal", &["UnmarshalYAML"]);

        // Binary encoding.
        db.add("(*encoding/gob.Encoder).Encode", &["GobEncode"]);
        db.add("(*encoding/gob.Decoder).Decode", &["GobDecode"]);
        db.add("encoding/binary.Write", &["MarshalBinary"]);
        db.add("encoding/binary.Read", &["UnmarshalBinary"]);

        // SQL row materialization.
        db.add("(*database/sql.DB).Query", &["Scan", "Value"]);
        db.add("(*database/sql.DB).QueryRow", &["Scan", "Value"]);
        db.add("(*database/sql.DB).Exec", &["Value"]);
        db.add("(*database/sql.Stmt).Query", &["Scan", "Value"]);
        db.add("(*database/sql.Stmt).QueryRow", &["Scan", "Value"]);
        db.add("(*database/sql.Stmt).Exec", &["Value"]);

        db
    }

    /// Register (or replace) a consumer entry.
    pub fn add(&mut self, function: &str, methods: &[&str]) {
        self.by_function.insert(
            function.to_string(),
            methods.iter().map(|m| m.to_string()).collect(),
        );
    }

    pub fn contains(&self, qualified: &str) -> bool {
        self.by_function.contains_key(qualified)
    }

    /// Methods the given consumer invokes, if it is allow-listed.
    pub fn methods_for(&self, qualified: &str) -> Option<&[String]> {
        self.by_function.get(qualified).map(|v| v.as_slice())
    }

    pub fn len(&self) -> usize {
        self.by_function.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_function.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_the_marshalling_families() {
        let db = ReflectionAllowlist::with_defaults();
        assert!(db.contains("encoding/json.Marshal"));
        assert!(db.contains("fmt.Printf"));
        assert!(db.contains("(*database/sql.Stmt).QueryRow"));
        assert!(!db.contains("example.com/app.Process"));

        let printf = db.methods_for("fmt.Printf").unwrap();
        assert!(printf.iter().any(|m| m == "Format"));
        let println = db.methods_for("fmt.Println").unwrap();
        assert!(!println.iter().any(|m| m == "Format"));
    }

    #[test]
    fn test_custom_entries_extend_the_defaults() {
        let mut db = ReflectionAllowlist::with_defaults();
        let before = db.len();
        db.add("example.com/tmpl.Render", &["RenderHTML"]);
        assert_eq!(db.len(), before + 1);
        assert_eq!(
            db.methods_for("example.com/tmpl.Render").unwrap(),
            &["RenderHTML".to_string()]
        );
    }

    #[test]
    fn test_empty_database_has_no_entries() {
        let db = ReflectionAllowlist::empty();
        assert!(db.is_empty());
        assert!(db.methods_for("fmt.Printf").is_none());
    }
}
