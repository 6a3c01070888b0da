/// Card normalization ahead of structural comparison.
///
/// Two cards that encode the same contact should normalize to equal trees.
/// Normalization removes fields that state a schema default, sorts
/// components of unordered structured values, drops converter-private
/// passthrough data and expands every localization patch into the full
/// localized card.
use tracing::debug;

use crate::card::{Card, CardMap, CardValue, ValueKind};
use crate::patch::{LOCALIZATIONS, apply_patch};

/// A default value that is elided wherever it is stated.
#[derive(Debug, Clone, Copy)]
enum Elided {
    Text(&'static str),
    Flag(bool),
}

impl Elided {
    fn matches(self, value: &CardValue) -> bool {
        match self {
            Self::Text(s) => value.as_str() == Some(s),
            Self::Flag(b) => value.as_bool() == Some(b),
        }
    }
}

/// Paths (with `*` for every member of a map or list) and the default value
/// stated there.
const DEFAULT_VALUES: &[(&[&str], Elided)] = &[
    (&["addresses", "*", "@type"], Elided::Text("Address")),
    (&["addresses", "*", "isOrdered"], Elided::Flag(false)),
    (&["addresses", "*", "components", "*", "@type"], Elided::Text("AddressComponent")),
    (&["anniversaries", "*", "@type"], Elided::Text("Anniversary")),
    (&["anniversaries", "*", "date", "@type"], Elided::Text("PartialDate")),
    (&["anniversaries", "*", "place", "@type"], Elided::Text("Address")),
    (&["calendars", "*", "@type"], Elided::Text("Calendar")),
    (&["cryptoKeys", "*", "@type"], Elided::Text("CryptoKey")),
    (&["directories", "*", "@type"], Elided::Text("Directory")),
    (&["emails", "*", "@type"], Elided::Text("EmailAddress")),
    (&["kind"], Elided::Text("individual")),
    (&["links", "*", "@type"], Elided::Text("Link")),
    (&["media", "*", "@type"], Elided::Text("Media")),
    (&["name", "@type"], Elided::Text("Name")),
    (&["name", "isOrdered"], Elided::Flag(false)),
    (&["name", "components", "*", "@type"], Elided::Text("NameComponent")),
    (&["nicknames", "*", "@type"], Elided::Text("Nickname")),
    (&["notes", "*", "@type"], Elided::Text("Note")),
    (&["notes", "*", "author", "@type"], Elided::Text("Author")),
    (&["onlineServices", "*", "@type"], Elided::Text("OnlineService")),
    (&["organizations", "*", "@type"], Elided::Text("Organization")),
    (&["organizations", "*", "units", "*", "@type"], Elided::Text("OrgUnit")),
    (&["personalInfo", "*", "@type"], Elided::Text("PersonalInfo")),
    (&["phones", "*", "@type"], Elided::Text("Phone")),
    (&["preferredLanguages", "*", "@type"], Elided::Text("LanguagePref")),
    (&["relatedTo", "*", "@type"], Elided::Text("Relation")),
    (&["schedulingAddresses", "*", "@type"], Elided::Text("SchedulingAddress")),
    (&["speakToAs", "@type"], Elided::Text("SpeakToAs")),
    (&["speakToAs", "pronouns", "*", "@type"], Elided::Text("Pronouns")),
    (&["titles", "*", "@type"], Elided::Text("Title")),
    (&["titles", "*", "kind"], Elided::Text("title")),
];

fn remove_default(node: &mut CardValue, path: &[&str], default: Elided) {
    match path {
        [] => {}
        [leaf] => {
            if let Some(map) = node.as_object_mut() {
                if map.get(*leaf).is_some_and(|v| default.matches(v)) {
                    map.remove(*leaf);
                }
            }
        }
        ["*", rest @ ..] => match node {
            CardValue::Object(map) => {
                for child in map.values_mut() {
                    remove_default(child, rest, default);
                }
            }
            CardValue::Array(items) => {
                for child in items {
                    remove_default(child, rest, default);
                }
            }
            CardValue::Null
            | CardValue::Bool(_)
            | CardValue::Integer(_)
            | CardValue::UnsignedInteger(_)
            | CardValue::Float(_)
            | CardValue::String(_) => {}
        },
        [key, rest @ ..] => {
            if let Some(child) = node.as_object_mut().and_then(|m| m.get_mut(*key)) {
                remove_default(child, rest, default);
            }
        }
    }
}

/// Sorts `components` of every map that does not declare `isOrdered: true`.
/// Children are sorted first so the sort keys of their parents are final.
fn sort_unordered_components(node: &mut CardValue) {
    match node {
        CardValue::Object(map) => {
            for child in map.values_mut() {
                sort_unordered_components(child);
            }
            let ordered = map
                .get("isOrdered")
                .and_then(CardValue::as_bool)
                .unwrap_or(false);
            if !ordered {
                if let Some(CardValue::Array(components)) = map.get_mut("components") {
                    components.sort_by_cached_key(CardValue::canonical_json);
                }
            }
        }
        CardValue::Array(items) => {
            for child in items {
                sort_unordered_components(child);
            }
        }
        CardValue::Null
        | CardValue::Bool(_)
        | CardValue::Integer(_)
        | CardValue::UnsignedInteger(_)
        | CardValue::Float(_)
        | CardValue::String(_) => {}
    }
}

/// Drops `vCardProps` entries for the `version` property.
fn strip_version_passthrough(card: &mut CardValue) {
    let Some(map) = card.as_object_mut() else {
        return;
    };
    let Some(CardValue::Array(props)) = map.get_mut("vCardProps") else {
        return;
    };
    props.retain(|p| {
        p.as_array()
            .and_then(|entry| entry.first())
            .and_then(CardValue::as_str)
            != Some("version")
    });
    if props.is_empty() {
        map.remove("vCardProps");
    }
}

/// Removes `group` from every `vCardParams` map, and the map itself if that
/// leaves it empty.
fn strip_group_params(node: &mut CardValue) {
    match node {
        CardValue::Object(map) => {
            if let Some(CardValue::Object(params)) = map.get_mut("vCardParams") {
                if params.remove("group").is_some() && params.is_empty() {
                    map.remove("vCardParams");
                }
            }
            for child in map.values_mut() {
                strip_group_params(child);
            }
        }
        CardValue::Array(items) => {
            for child in items {
                strip_group_params(child);
            }
        }
        CardValue::Null
        | CardValue::Bool(_)
        | CardValue::Integer(_)
        | CardValue::UnsignedInteger(_)
        | CardValue::Float(_)
        | CardValue::String(_) => {}
    }
}

/// Puts back every top-level base key that normalization removed from the
/// localized card.
///
/// A resolved localization is itself read as a patch over the base when the
/// card is normalized again, and a patch cannot remove keys. Without these
/// keys the base value would reappear: a localized `kind` of `individual`
/// would turn back into the base's `group`. Scalars are restored as
/// patched, maps and lists as empty containers.
fn restore_dropped_keys(base: &Card, patched: &Card, localized: &mut Card) {
    let (Some(base), Some(patched), Some(localized)) =
        (base.as_object(), patched.as_object(), localized.as_object_mut())
    else {
        return;
    };
    for key in base.keys() {
        if localized.contains_key(key) {
            continue;
        }
        let Some(value) = patched.get(key) else {
            continue;
        };
        let restored = match value.kind() {
            ValueKind::Map => CardValue::Object(CardMap::new()),
            ValueKind::List => CardValue::Array(Vec::new()),
            ValueKind::Scalar => value.clone(),
        };
        localized.insert(key.clone(), restored);
    }
}

/// Turns one localization patch into the normalized localized card.
/// Anything that is not a patch map is returned unchanged.
fn resolve_localization(base: &Card, locale: &str, patch: CardValue) -> CardValue {
    if let CardValue::Object(entries) = &patch {
        let mut patched = base.clone();
        let report = apply_patch(&mut patched, entries);
        for err in &report.rejected {
            debug!(locale, error = %err, "dropping localization patch entry");
        }
        let mut localized = normalize(&patched);
        restore_dropped_keys(base, &patched, &mut localized);
        return localized;
    }
    patch
}

/// Normalizes `card` in place.
pub fn normalize_in_place(card: &mut Card) {
    let localizations = card.as_object_mut().and_then(|m| m.remove(LOCALIZATIONS));

    for (path, default) in DEFAULT_VALUES {
        remove_default(card, path, *default);
    }
    strip_version_passthrough(card);
    strip_group_params(card);
    // Last: the sort keys include everything stripped above.
    sort_unordered_components(card);

    let Some(mut localizations) = localizations else {
        return;
    };
    if let CardValue::Object(locales) = &mut localizations {
        if locales.is_empty() {
            return;
        }
        let patches = std::mem::take(locales);
        for (locale, patch) in patches {
            let resolved = resolve_localization(card, &locale, patch);
            locales.insert(locale, resolved);
        }
        debug!(count = locales.len(), "resolved localizations");
    }
    if let Some(map) = card.as_object_mut() {
        map.insert(LOCALIZATIONS.to_owned(), localizations);
    }
}

/// Returns a normalized copy of `card`.
pub fn normalize(card: &Card) -> Card {
    let mut out = card.clone();
    normalize_in_place(&mut out);
    out
}
