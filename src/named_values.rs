use serde::{Deserialize, Serialize};

/// A name and a value associated with that name, as carried by CAP `parameter`, `eventCode` and
/// `geocode` elements.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedValue {
    pub value_name: String,
    pub value: String,
}

impl NamedValue {
    pub fn new<N: Into<String>, V: Into<String>>(value_name: N, value: V) -> Self {
        Self {
            value_name: value_name.into(),
            value: value.into(),
        }
    }
}

/// An ordered list of [`NamedValue`]s.
///
/// Names are not unique: NWS alerts routinely repeat a name (several `FIPS6` geocodes, for
/// instance), so lookups come in two flavors. [`first`](Self::first) returns the value of the
/// earliest matching pair and [`all`](Self::all) returns every matching value in document order.
/// Names are compared exactly and case-sensitively.
///
/// # Example
///
/// ```
/// let mut geocodes = cap_feed::NamedValues::new();
/// geocodes.add("FIPS6", "005067");
/// geocodes.add("UGC", "ARC067");
/// geocodes.add("FIPS6", "005147");
///
/// assert_eq!(geocodes.first("FIPS6"), Some("005067"));
/// assert_eq!(geocodes.all("FIPS6"), vec!["005067", "005147"]);
/// assert_eq!(geocodes.first("fips6"), None);
/// assert!(geocodes.all("SAME").is_empty());
/// ```
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NamedValues(Vec<NamedValue>);

impl NamedValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a pair after every existing pair.
    pub fn add<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.0.push(NamedValue::new(name, value));
    }

    pub fn push(&mut self, named_value: NamedValue) {
        self.0.push(named_value);
    }

    /// The value of the first pair named `name`, if any.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|nv| nv.value_name == name)
            .map(|nv| nv.value.as_str())
    }

    /// The values of every pair named `name`, in document order.
    pub fn all(&self, name: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|nv| nv.value_name == name)
            .map(|nv| nv.value.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedValue> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[NamedValue] {
        &self.0
    }
}

impl std::ops::Index<usize> for NamedValues {
    type Output = NamedValue;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl From<Vec<NamedValue>> for NamedValues {
    fn from(v: Vec<NamedValue>) -> Self {
        Self(v)
    }
}

impl FromIterator<NamedValue> for NamedValues {
    fn from_iter<I: IntoIterator<Item = NamedValue>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a NamedValues {
    type Item = &'a NamedValue;
    type IntoIter = std::slice::Iter<'a, NamedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for NamedValues {
    type Item = NamedValue;
    type IntoIter = std::vec::IntoIter<NamedValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
