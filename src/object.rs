// Object utilities: deep-merge extension, key enumeration, value filtering

use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::value::{JValue, Map};

/// How a `null` in the source is merged into the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullPolicy {
    /// `null` merges like an empty object: a truthy target value is kept,
    /// anything else becomes `{}`.
    #[default]
    MergeAsEmpty,
    /// `null` is a scalar and overwrites whatever the target holds.
    Assign,
}

/// Merge options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeOptions {
    pub null_policy: NullPolicy,
}

/// Deep-merges source mappings into target mappings.
///
/// Arrays are replaced wholesale by a shallow copy, objects are merged
/// recursively, every other value is assigned by reference.
#[derive(Debug, Clone, Default)]
pub struct Extender {
    options: MergeOptions,
}

impl Extender {
    pub fn new() -> Self {
        Extender {
            options: MergeOptions::default(),
        }
    }

    pub fn with_options(options: MergeOptions) -> Self {
        Extender { options }
    }

    pub fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Merge `source` into `target` in place and return `target`.
    pub fn extend<'a>(&self, target: &'a mut Map, source: &Map) -> &'a mut Map {
        self.extend_at(target, source, 0);
        target
    }

    /// Value-level merge. A non-object `target` is replaced by `{}` first;
    /// a non-object `source` contributes no keys.
    pub fn extend_value<'a>(&self, target: &'a mut JValue, source: &JValue) -> &'a mut JValue {
        let map = object_slot(target);
        if let JValue::Object(src) = source {
            self.extend_at(map, src, 0);
        }
        target
    }

    /// Non-mutating merge: a new map holding `target` extended by `source`.
    pub fn merged(&self, target: &Map, source: &Map) -> Map {
        let mut out = target.clone();
        self.extend_at(&mut out, source, 0);
        out
    }

    fn extend_at(&self, target: &mut Map, source: &Map, depth: usize) {
        for (key, value) in source {
            match value {
                JValue::Array(items) => {
                    trace!(key = %key, depth, len = items.len(), "replacing array");
                    target.insert(key.clone(), JValue::Array(Rc::new(items.to_vec())));
                }
                JValue::Object(nested) => {
                    trace!(key = %key, depth, "merging object");
                    let slot = target.entry(key.clone()).or_insert(JValue::Undefined);
                    self.extend_at(object_slot(slot), nested, depth + 1);
                }
                JValue::Null if self.options.null_policy == NullPolicy::MergeAsEmpty => {
                    let slot = target.entry(key.clone()).or_insert(JValue::Undefined);
                    if !slot.is_truthy() {
                        trace!(key = %key, depth, "null merged as empty object");
                        *slot = JValue::empty_object();
                    }
                }
                other => {
                    target.insert(key.clone(), other.clone());
                }
            }
        }
    }
}

/// Turn `slot` into an object (a fresh `{}` unless it already is one) and
/// borrow its map, copying on write when shared.
fn object_slot(slot: &mut JValue) -> &mut Map {
    if !slot.is_object() {
        *slot = JValue::empty_object();
    }
    match slot {
        JValue::Object(map) => Rc::make_mut(map),
        _ => unreachable!("slot was just made an object"),
    }
}

/// Merge `source` into `target` in place with default options and return
/// `target`.
///
/// ```
/// use objutil::{extend, jvalue};
///
/// let mut target = jvalue!({"a": {"x": 1}, "b": [1, 2]});
/// let source = jvalue!({"a": {"y": 2}, "b": [3, 4, 5], "c": "new"});
/// extend(target.as_object_mut().unwrap(), source.as_object().unwrap());
///
/// assert_eq!(target, jvalue!({"a": {"x": 1, "y": 2}, "b": [3, 4, 5], "c": "new"}));
/// ```
pub fn extend<'a>(target: &'a mut Map, source: &Map) -> &'a mut Map {
    Extender::new().extend(target, source)
}

/// Value-level [`extend`] with default options.
pub fn extend_value<'a>(target: &'a mut JValue, source: &JValue) -> &'a mut JValue {
    Extender::new().extend_value(target, source)
}

/// Non-mutating [`extend`] with default options.
pub fn merged(target: &Map, source: &Map) -> Map {
    Extender::new().merged(target, source)
}

/// Keys of `obj` in enumeration order.
pub fn keys(obj: &Map) -> Vec<String> {
    obj.keys().cloned().collect()
}

/// New map with the entries of `obj` whose value satisfies `func`.
pub fn filter<F>(obj: &Map, mut func: F) -> Map
where
    F: FnMut(&JValue) -> bool,
{
    obj.iter()
        .filter(|(_, v)| func(v))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Like [`filter`], but stops at and returns the first predicate error.
pub fn try_filter<E, F>(obj: &Map, mut func: F) -> Result<Map, E>
where
    F: FnMut(&JValue) -> Result<bool, E>,
{
    let mut result = Map::new();
    for (key, value) in obj {
        if func(value)? {
            result.insert(key.clone(), value.clone());
        }
    }
    Ok(result)
}

/// Like [`filter`], keeping entries whose predicate result is truthy.
pub fn filter_truthy<F>(obj: &Map, mut func: F) -> Map
where
    F: FnMut(&JValue) -> JValue,
{
    filter(obj, |v| func(v).is_truthy())
}
