//! Leaf criteria.

use super::SelectCriteria;
use crate::model::{Value, XmlError, XmlPath};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchTest {
    /// Contributes no predicate; the leaf may still carry a sort order.
    #[default]
    None,
    Equal,
    NotEqual,
    Like,
    NotLike,
    Between,
    In,
    NotIn,
    LessThan,
    LessThanOrEqual,
    MoreThan,
    MoreThanOrEqual,
    Null,
    NotNull,
}

impl SearchTest {
    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Equal => "Equal",
            Self::NotEqual => "NotEqual",
            Self::Like => "Like",
            Self::NotLike => "NotLike",
            Self::Between => "Between",
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::LessThan => "LessThan",
            Self::LessThanOrEqual => "LessThanOrEqual",
            Self::MoreThan => "MoreThan",
            Self::MoreThanOrEqual => "MoreThanOrEqual",
            Self::Null => "Null",
            Self::NotNull => "NotNull",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Position of a leaf in the ORDER BY list; lower positions sort first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub position: u32,
    pub direction: SortDirection,
}

/// Field-operator-values predicate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCondition {
    test: SearchTest,
    values: Vec<Value>,
    sort: Option<SortOrder>,
}

impl SearchCondition {
    pub fn new(test: SearchTest, values: Vec<Value>) -> Self {
        Self {
            test,
            values,
            sort: None,
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn equal_to(value: impl Into<Value>) -> Self {
        Self::new(SearchTest::Equal, vec![value.into()])
    }

    pub fn not_equal_to(value: impl Into<Value>) -> Self {
        Self::new(SearchTest::NotEqual, vec![value.into()])
    }

    pub fn like(pattern: impl Into<Value>) -> Self {
        Self::new(SearchTest::Like, vec![pattern.into()])
    }

    pub fn not_like(pattern: impl Into<Value>) -> Self {
        Self::new(SearchTest::NotLike, vec![pattern.into()])
    }

    pub fn between(low: impl Into<Value>, high: impl Into<Value>) -> Self {
        Self::new(SearchTest::Between, vec![low.into(), high.into()])
    }

    pub fn in_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(SearchTest::In, values.into_iter().map(Into::into).collect())
    }

    pub fn not_in_values<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::new(SearchTest::NotIn, values.into_iter().map(Into::into).collect())
    }

    pub fn less_than(value: impl Into<Value>) -> Self {
        Self::new(SearchTest::LessThan, vec![value.into()])
    }

    pub fn less_than_or_equal(value: impl Into<Value>) -> Self {
        Self::new(SearchTest::LessThanOrEqual, vec![value.into()])
    }

    pub fn more_than(value: impl Into<Value>) -> Self {
        Self::new(SearchTest::MoreThan, vec![value.into()])
    }

    pub fn more_than_or_equal(value: impl Into<Value>) -> Self {
        Self::new(SearchTest::MoreThanOrEqual, vec![value.into()])
    }

    pub fn is_null() -> Self {
        Self::new(SearchTest::Null, Vec::new())
    }

    pub fn is_not_null() -> Self {
        Self::new(SearchTest::NotNull, Vec::new())
    }

    /// Sort-only leaf.
    pub fn sort_asc(position: u32) -> Self {
        Self::none().sorted(position, SortDirection::Ascending)
    }

    /// Sort-only leaf.
    pub fn sort_desc(position: u32) -> Self {
        Self::none().sorted(position, SortDirection::Descending)
    }

    pub fn sorted(mut self, position: u32, direction: SortDirection) -> Self {
        self.sort = Some(SortOrder {
            position,
            direction,
        });
        self
    }

    pub fn test(&self) -> SearchTest {
        self.test
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn sort(&self) -> Option<SortOrder> {
        self.sort
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XmlTest {
    Equal,
    Like,
}

/// Compares the text an XPath selects inside an XML column.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlPathCondition {
    path: XmlPath,
    test: XmlTest,
    value: String,
}

impl XmlPathCondition {
    pub fn equal(path: &str, value: impl Into<String>) -> Result<Self, XmlError> {
        Ok(Self {
            path: XmlPath::parse(path)?,
            test: XmlTest::Equal,
            value: value.into(),
        })
    }

    pub fn like(path: &str, pattern: impl Into<String>) -> Result<Self, XmlError> {
        Ok(Self {
            path: XmlPath::parse(path)?,
            test: XmlTest::Like,
            value: pattern.into(),
        })
    }

    pub fn path(&self) -> &XmlPath {
        &self.path
    }

    pub fn test(&self) -> XmlTest {
        self.test
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelatedTest {
    Exists,
    NotExists,
}

/// Correlated EXISTS / NOT EXISTS against another entity's criteria.
///
/// `base_column` names a field of the enclosing entity and `related_column`
/// a field of the related one; either may be a key alias.
#[derive(Debug, Clone)]
pub struct RelatedEntityCondition {
    test: RelatedTest,
    criteria: SelectCriteria,
    base_column: String,
    related_column: String,
}

impl RelatedEntityCondition {
    pub fn new(
        test: RelatedTest,
        criteria: SelectCriteria,
        base_column: impl Into<String>,
        related_column: impl Into<String>,
    ) -> Self {
        Self {
            test,
            criteria,
            base_column: base_column.into(),
            related_column: related_column.into(),
        }
    }

    pub fn exists(
        criteria: SelectCriteria,
        base_column: impl Into<String>,
        related_column: impl Into<String>,
    ) -> Self {
        Self::new(RelatedTest::Exists, criteria, base_column, related_column)
    }

    pub fn not_exists(
        criteria: SelectCriteria,
        base_column: impl Into<String>,
        related_column: impl Into<String>,
    ) -> Self {
        Self::new(RelatedTest::NotExists, criteria, base_column, related_column)
    }

    pub fn test(&self) -> RelatedTest {
        self.test
    }

    pub fn criteria(&self) -> &SelectCriteria {
        &self.criteria
    }

    pub fn base_column(&self) -> &str {
        &self.base_column
    }

    pub fn related_column(&self) -> &str {
        &self.related_column
    }
}
