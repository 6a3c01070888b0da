/// Deterministic ordering of a parsed [`Record`].
///
/// The matcher performs unordered multiset matching, so its verdict does not
/// depend on property order. Its *diagnostics* and the order in which
/// first-fit candidates are consumed do, and canonicalizing first makes both
/// reproducible for a given payload regardless of emission order.
use crate::record::{Property, Record};

/// A record split into its optional `BEGIN`/`END` envelope and a sorted body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRecord {
    /// The `BEGIN` and `END` properties, if the record had both around a
    /// non-empty body.
    pub envelope: Option<(Property, Property)>,
    /// Body properties sorted by `(name, value)`, each with parameters
    /// sorted by `(name, value)`.
    pub properties: Vec<Property>,
}

impl CanonicalRecord {
    /// Reassembles the record with the envelope around the sorted body.
    pub fn into_record(self) -> Record {
        match self.envelope {
            Some((begin, end)) => {
                let mut properties = Vec::with_capacity(self.properties.len() + 2);
                properties.push(begin);
                properties.extend(self.properties);
                properties.push(end);
                Record::new(properties)
            }
            None => Record::new(self.properties),
        }
    }
}

/// Canonicalizes a copy of `record`.
///
/// The envelope is spliced off only when the record has more than two
/// properties, the first is named `BEGIN` and the last `END`. All sorts are
/// stable, so properties equal on `(name, value)` keep their relative order.
pub fn canonicalize(record: &Record) -> CanonicalRecord {
    let mut properties = record.properties.clone();

    let has_envelope = properties.len() > 2
        && properties.first().is_some_and(|p| p.name == "BEGIN")
        && properties.last().is_some_and(|p| p.name == "END");
    let envelope = if has_envelope {
        let end = properties.pop();
        let begin = (!properties.is_empty()).then(|| properties.remove(0));
        begin.zip(end)
    } else {
        None
    };

    for prop in &mut properties {
        prop.params.sort_by(|a, b| (&a.name, &a.value).cmp(&(&b.name, &b.value)));
    }
    properties.sort_by(|a, b| (&a.name, &a.value).cmp(&(&b.name, &b.value)));

    CanonicalRecord {
        envelope,
        properties,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::record::parse_record;

    fn record(lines: &[&str]) -> Record {
        let mut text = lines.join("\r\n");
        text.push_str("\r\n");
        parse_record(&text).expect("valid record")
    }

    #[test]
    fn splits_envelope_and_sorts_body() {
        let r = record(&[
            "BEGIN:VCARD",
            "VERSION:4.0",
            "FN:Jane",
            "EMAIL;TYPE=work;PREF=1:b@example.com",
            "EMAIL:a@example.com",
            "END:VCARD",
        ]);
        let c = canonicalize(&r);
        let (begin, end) = c.envelope.as_ref().expect("envelope");
        assert_eq!(begin.name, "BEGIN");
        assert_eq!(end.name, "END");
        let names: Vec<_> = c.properties.iter().map(|p| p.value.as_str()).collect();
        assert_eq!(names, vec!["a@example.com", "b@example.com", "Jane", "4.0"]);
        let params: Vec<_> = c.properties[1].params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(params, vec!["PREF", "TYPE"]);
    }

    #[test]
    fn envelope_needs_a_body() {
        let r = record(&["BEGIN:VCARD", "END:VCARD"]);
        let c = canonicalize(&r);
        assert!(c.envelope.is_none());
        assert_eq!(c.properties.len(), 2);
    }

    #[test]
    fn envelope_needs_both_markers() {
        let r = record(&["BEGIN:VCARD", "UID:x", "FN:y"]);
        assert!(canonicalize(&r).envelope.is_none());
    }

    #[test]
    fn input_record_is_untouched() {
        let r = record(&["BEGIN:VCARD", "Z:1", "A:2", "END:VCARD"]);
        let before = r.clone();
        let _sorted = canonicalize(&r);
        assert_eq!(r, before);
    }

    #[test]
    fn canonicalize_is_idempotent() {
        let r = record(&[
            "BEGIN:VCARD",
            "X;B=2;A=1;A=0:z",
            "X:a",
            "G.X:a",
            "END:VCARD",
        ]);
        let once = canonicalize(&r).into_record();
        let twice = canonicalize(&once).into_record();
        assert_eq!(once, twice);
    }
}
