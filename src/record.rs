use alloc::borrow::ToOwned;
use alloc::format;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::KeyOrder;

/// Returned by [`Record::describe`] when no describer is attached.
pub const NO_DESCRIPTION: &str = "No description";

/// Shown in a record's listing line when no describer is attached.
pub const NO_CATEGORY_INFO: &str = "No course information";

/// Produces a human-readable category line for a record.
///
/// The record is handed in on every call, so a describer never needs to hold on to the
/// record it decorates. Any `Fn(&Record) -> String` closure is a describer.
///
/// # Examples
///
/// ```
/// use roster_tree::Record;
///
/// let record = Record::new("Petrov", "Egor", "TR-322", 4321)
///     .with_describer(|r: &Record| format!("{} (exchange)", r.full_name()));
/// assert_eq!(record.describe(), "Egor Petrov (exchange)");
/// ```
pub trait Describe: Send + Sync {
    /// Renders the category line for `record`.
    fn describe(&self, record: &Record) -> String;
}

impl<F> Describe for F
where
    F: Fn(&Record) -> String + Send + Sync,
{
    fn describe(&self, record: &Record) -> String {
        self(record)
    }
}

/// Describes a record as a first-year student of its group.
#[derive(Clone, Copy, Debug, Default)]
pub struct FirstYear;

impl Describe for FirstYear {
    fn describe(&self, record: &Record) -> String {
        format!("{} - first-year-student {}", record.full_name(), record.group())
    }
}

/// Describes a record as a second-year student of its group.
#[derive(Clone, Copy, Debug, Default)]
pub struct SecondYear;

impl Describe for SecondYear {
    fn describe(&self, record: &Record) -> String {
        format!("{} - second-year-student {}", record.full_name(), record.group())
    }
}

/// The comparable key of a record under some [`KeyOrder`].
///
/// Keys built with different orderings never meet inside one index.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum RecordKey {
    /// `surname ++ decimal(id)`, compared as text.
    Concatenated(String),
    /// Surname compared as text, then id compared as a number.
    SurnameThenId(String, i64),
}

impl RecordKey {
    /// Builds the key for `surname` and `id`.
    #[must_use]
    pub fn new(surname: &str, id: i64, order: KeyOrder) -> Self {
        match order {
            KeyOrder::Concatenated => Self::Concatenated(format!("{surname}{id}")),
            KeyOrder::SurnameThenId => Self::SurnameThenId(surname.to_owned(), id),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Concatenated(text) => f.write_str(text),
            Self::SurnameThenId(surname, id) => write!(f, "{surname}/{id}"),
        }
    }
}

/// A roster entry: identity fields plus an optional describer.
///
/// The identity fields are fixed at construction. Only the describer can be replaced, and
/// clones share it.
#[derive(Clone)]
pub struct Record {
    surname: String,
    given_name: String,
    group: String,
    id: i64,
    describer: Option<Arc<dyn Describe>>,
}

impl Record {
    /// Creates a record without a describer.
    pub fn new(surname: impl Into<String>, given_name: impl Into<String>, group: impl Into<String>, id: i64) -> Self {
        Self {
            surname: surname.into(),
            given_name: given_name.into(),
            group: group.into(),
            id,
            describer: None,
        }
    }

    #[must_use]
    pub fn surname(&self) -> &str {
        &self.surname
    }

    #[must_use]
    pub fn given_name(&self) -> &str {
        &self.given_name
    }

    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    /// Returns `surname ++ decimal(id)`, the text the default ordering compares.
    ///
    /// ```
    /// use roster_tree::Record;
    ///
    /// assert_eq!(Record::new("Sidorov", "Sidor", "TM-100", 9876).derive_key(), "Sidorov9876");
    /// ```
    #[must_use]
    pub fn derive_key(&self) -> String {
        format!("{}{}", self.surname, self.id)
    }

    /// Returns the comparable key under `order`.
    #[must_use]
    pub fn key(&self, order: KeyOrder) -> RecordKey {
        RecordKey::new(&self.surname, self.id, order)
    }

    /// Returns `given_name surname`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.given_name, self.surname)
    }

    /// Replaces the describer, dropping this record's handle on the old one. `None`
    /// clears it.
    pub fn set_describer(&mut self, describer: Option<Arc<dyn Describe>>) {
        self.describer = describer;
    }

    /// Attaches `describer`, replacing any existing one.
    #[must_use]
    pub fn with_describer<D: Describe + 'static>(mut self, describer: D) -> Self {
        self.describer = Some(Arc::new(describer));
        self
    }

    #[must_use]
    pub fn has_describer(&self) -> bool {
        self.describer.is_some()
    }

    /// Returns the describer's output, or [`NO_DESCRIPTION`] if none is attached.
    #[must_use]
    pub fn describe(&self) -> String {
        self.category().unwrap_or_else(|| NO_DESCRIPTION.to_owned())
    }

    /// Returns the describer's output, or `None` if none is attached.
    #[must_use]
    pub fn category(&self) -> Option<String> {
        self.describer.as_ref().map(|describer| describer.describe(self))
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("surname", &self.surname)
            .field("given_name", &self.given_name)
            .field("group", &self.group)
            .field("id", &self.id)
            .field("has_describer", &self.describer.is_some())
            .finish()
    }
}

/// The listing line for a record, with [`NO_CATEGORY_INFO`] standing in for a missing
/// describer.
impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Surname: {}, Name: {}, Group: {}, Id: {}, Description: ",
            self.surname, self.given_name, self.group, self.id
        )?;
        match self.category() {
            Some(category) => f.write_str(&category),
            None => f.write_str(NO_CATEGORY_INFO),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use pretty_assertions::assert_eq;

    fn ivanov() -> Record {
        Record::new("Ivanov", "Ivan", "TM-100", 1234)
    }

    #[test]
    fn derived_key_concatenates_decimal_id() {
        assert_eq!(ivanov().derive_key(), "Ivanov1234");
        assert_eq!(Record::new("Ivanov", "Ivan", "TM-100", -5).derive_key(), "Ivanov-5");
        assert_eq!(ivanov().key(KeyOrder::Concatenated), RecordKey::Concatenated("Ivanov1234".into()));
    }

    #[test]
    fn concatenated_order_is_textual() {
        let nine = RecordKey::new("Ivanov", 9, KeyOrder::Concatenated);
        let ten = RecordKey::new("Ivanov", 10, KeyOrder::Concatenated);
        assert!(ten < nine);

        let nine = RecordKey::new("Ivanov", 9, KeyOrder::SurnameThenId);
        let ten = RecordKey::new("Ivanov", 10, KeyOrder::SurnameThenId);
        assert!(nine < ten);
    }

    #[test]
    fn full_name_puts_given_name_first() {
        assert_eq!(ivanov().full_name(), "Ivan Ivanov");
    }

    #[test]
    fn built_in_describers() {
        let first = ivanov().with_describer(FirstYear);
        assert_eq!(first.describe(), "Ivan Ivanov - first-year-student TM-100");

        let second = ivanov().with_describer(SecondYear);
        assert_eq!(second.describe(), "Ivan Ivanov - second-year-student TM-100");
    }

    #[test]
    fn missing_describer_uses_sentinels() {
        let record = ivanov();
        assert!(!record.has_describer());
        assert_eq!(record.describe(), NO_DESCRIPTION);
        assert_eq!(record.category(), None);
        assert_eq!(
            record.to_string(),
            "Surname: Ivanov, Name: Ivan, Group: TM-100, Id: 1234, Description: No course information"
        );
    }

    #[test]
    fn set_describer_replaces_and_clears() {
        let mut record = ivanov().with_describer(FirstYear);
        record.set_describer(Some(Arc::new(SecondYear)));
        assert_eq!(record.category().as_deref(), Some("Ivan Ivanov - second-year-student TM-100"));

        record.set_describer(None);
        assert!(!record.has_describer());
        assert_eq!(record.describe(), NO_DESCRIPTION);
    }

    #[test]
    fn listing_line_uses_describer() {
        let record = Record::new("Petrov", "Egor", "TR-322", 4321).with_describer(SecondYear);
        assert_eq!(
            record.to_string(),
            "Surname: Petrov, Name: Egor, Group: TR-322, Id: 4321, Description: Egor Petrov - second-year-student TR-322"
        );
    }

    #[test]
    fn clones_share_the_describer() {
        let describer: Arc<dyn Describe> = Arc::new(FirstYear);
        let mut record = ivanov();
        record.set_describer(Some(Arc::clone(&describer)));

        let copy = record.clone();
        assert_eq!(Arc::strong_count(&describer), 3);
        drop(record);
        assert_eq!(copy.describe(), "Ivan Ivanov - first-year-student TM-100");
    }

    #[test]
    fn debug_omits_describer_internals() {
        let text = alloc::format!("{:?}", ivanov().with_describer(FirstYear));
        assert!(text.contains("has_describer: true"));
    }
}
