//! Criteria tree to WHERE / ORDER BY compilation.
//!
//! # Responsibility
//! - Walk a criteria tree in insertion order and emit one predicate per
//!   active leaf, binding every value through the parameter sink.
//! - Compile related-entity conditions into correlated sub-selects.
//! - Collect sort leaves into an ORDER BY list.
//!
//! # Invariants
//! - Leaves with `SearchTest::None` emit nothing.
//! - `Between` binds exactly two parameters, `In`/`NotIn` one per value.
//! - Sub-selects never carry an ORDER BY.

use super::binder::bind_value;
use super::dialect::Dialect;
use super::statement::{OrderBy, ParamSink, WhereClause};
use crate::broker::{BrokerError, BrokerResult};
use crate::criteria::{
    Criteria, CriteriaGroup, RelatedEntityCondition, RelatedTest, SearchCondition, SearchTest,
    SelectCriteria, SortOrder, XmlPathCondition, XmlTest,
};
use crate::mapping::naming;
use crate::mapping::{type_map, MappingError, MappingErrorKind, ResolvedColumn, TypeMap};
use crate::model::{FieldKind, Value};
use rusqlite::types::Value as SqlValue;

pub(crate) struct CriteriaCompiler<'s> {
    dialect: Dialect,
    sink: &'s mut ParamSink,
}

impl<'s> CriteriaCompiler<'s> {
    pub(crate) fn new(dialect: Dialect, sink: &'s mut ParamSink) -> Self {
        Self { dialect, sink }
    }

    /// Compiles the predicates of `criteria` against its own table.
    pub(crate) fn compile(&mut self, criteria: &SelectCriteria) -> BrokerResult<WhereClause> {
        let map = type_map::resolve(criteria.descriptor())?;
        let mut clause = WhereClause::default();
        self.compile_group(&map, criteria.root(), &mut clause)?;
        Ok(clause)
    }

    fn compile_group(
        &mut self,
        map: &TypeMap,
        group: &CriteriaGroup,
        out: &mut WhereClause,
    ) -> BrokerResult<()> {
        for (key, node) in group.iter() {
            match node {
                Criteria::Condition(condition) => {
                    self.compile_condition(map, key, condition, out)?
                }
                Criteria::XmlPath(condition) => self.compile_xml_path(map, key, condition, out)?,
                // A related condition names no column of its own; only the
                // correlation pair matters.
                Criteria::Related(related) => self.compile_related(map, related, out)?,
                Criteria::Group(child) => self.compile_group(map, child, out)?,
            }
        }
        Ok(())
    }

    fn compile_condition(
        &mut self,
        map: &TypeMap,
        field: &str,
        condition: &SearchCondition,
        out: &mut WhereClause,
    ) -> BrokerResult<()> {
        let test = condition.test();
        if test == SearchTest::None {
            return Ok(());
        }

        let target = resolve_column(map, field)?;
        let column = Dialect::quote(target.column);
        let param = naming::parameter_name(field);
        let values = condition.values();
        let entity = map.entity();

        let predicate = match test {
            SearchTest::None => return Ok(()),
            SearchTest::Null => {
                expect_values(entity, field, test, values, 0)?;
                format!("{column} IS NULL")
            }
            SearchTest::NotNull => {
                expect_values(entity, field, test, values, 0)?;
                format!("{column} IS NOT NULL")
            }
            SearchTest::Between => {
                expect_values(entity, field, test, values, 2)?;
                let low = self.bind(entity, field, target.kind, &format!("{param}1"), &values[0])?;
                let high = self.bind(entity, field, target.kind, &format!("{param}2"), &values[1])?;
                format!("{column} BETWEEN {low} AND {high}")
            }
            SearchTest::In | SearchTest::NotIn => {
                if values.is_empty() {
                    return Err(BrokerError::invariant(
                        entity,
                        format!("`{}` on `{field}` requires at least one value", test.name()),
                    ));
                }
                let mut placeholders = Vec::with_capacity(values.len());
                for (index, value) in values.iter().enumerate() {
                    let name = format!("{param}{}", index + 1);
                    placeholders.push(self.bind(entity, field, target.kind, &name, value)?);
                }
                let keyword = if test == SearchTest::In { "IN" } else { "NOT IN" };
                format!("{column} {keyword} ({})", placeholders.join(", "))
            }
            SearchTest::Like | SearchTest::NotLike => {
                expect_values(entity, field, test, values, 1)?;
                let pattern = self.bind(entity, field, target.kind, &param, &values[0])?;
                let keyword = if test == SearchTest::Like { "LIKE" } else { "NOT LIKE" };
                format!("{} {keyword} {pattern}", self.dialect.like_operand(&column))
            }
            SearchTest::Equal
            | SearchTest::NotEqual
            | SearchTest::LessThan
            | SearchTest::LessThanOrEqual
            | SearchTest::MoreThan
            | SearchTest::MoreThanOrEqual => {
                expect_values(entity, field, test, values, 1)?;
                let placeholder = self.bind(entity, field, target.kind, &param, &values[0])?;
                format!("{column} {} {placeholder}", comparison_operator(test))
            }
        };

        out.push(predicate);
        Ok(())
    }

    fn compile_xml_path(
        &mut self,
        map: &TypeMap,
        field: &str,
        condition: &XmlPathCondition,
        out: &mut WhereClause,
    ) -> BrokerResult<()> {
        let target = resolve_column(map, field)?;
        if target.kind != FieldKind::Xml {
            return Err(BrokerError::unsupported(map.entity(), field, "xml path"));
        }

        let placeholder = self.sink.bind(
            &naming::parameter_name(field),
            SqlValue::Text(condition.value().to_string()),
        );
        let extracted = self
            .dialect
            .xml_value(&Dialect::quote(target.column), condition.path());
        let keyword = match condition.test() {
            XmlTest::Equal => "=",
            XmlTest::Like => "LIKE",
        };
        out.push(format!("{extracted} {keyword} {placeholder}"));
        Ok(())
    }

    fn compile_related(
        &mut self,
        base: &TypeMap,
        related: &RelatedEntityCondition,
        out: &mut WhereClause,
    ) -> BrokerResult<()> {
        let related_map = type_map::resolve(related.criteria().descriptor())?;
        let base_column = resolve_column(base, related.base_column())?;
        let related_column = resolve_column(&related_map, related.related_column())?;

        let mut clause = WhereClause::default();
        clause.push(format!(
            "{} = {}",
            Dialect::qualified(base.entity(), base_column.column),
            Dialect::qualified(related_map.entity(), related_column.column)
        ));
        self.compile_group(&related_map, related.criteria().root(), &mut clause)?;

        let subselect = format!(
            "SELECT * FROM {}{}",
            Dialect::quote(related_map.entity()),
            clause.render()
        );
        out.push(match related.test() {
            RelatedTest::Exists => format!("EXISTS ({subselect})"),
            RelatedTest::NotExists => format!("NOT EXISTS ({subselect})"),
        });
        Ok(())
    }

    fn bind(
        &mut self,
        entity: &str,
        field: &str,
        kind: FieldKind,
        name: &str,
        value: &Value,
    ) -> BrokerResult<String> {
        let bound = bind_value(entity, field, kind, value)?;
        Ok(self.sink.bind(name, bound))
    }
}

/// Table-qualified ORDER BY terms from sort leaves of the top level and its
/// groups, by position then insertion order.
pub(crate) fn order_by(criteria: &SelectCriteria, map: &TypeMap) -> BrokerResult<OrderBy> {
    let mut sorts = Vec::new();
    collect_sorts(map, criteria.root(), &mut sorts)?;
    sorts.sort_by_key(|(order, _)| order.position);

    let mut order = OrderBy::default();
    for (sort, column) in sorts {
        order.push(format!(
            "{} {}",
            Dialect::qualified(map.entity(), &column),
            sort.direction.keyword()
        ));
    }
    Ok(order)
}

fn collect_sorts(
    map: &TypeMap,
    group: &CriteriaGroup,
    out: &mut Vec<(SortOrder, String)>,
) -> BrokerResult<()> {
    for (key, node) in group.iter() {
        match node {
            Criteria::Condition(condition) => {
                if let Some(sort) = condition.sort() {
                    let column = resolve_column(map, key)?.column.to_string();
                    out.push((sort, column));
                }
            }
            Criteria::Group(child) => collect_sorts(map, child, out)?,
            Criteria::XmlPath(_) | Criteria::Related(_) => {}
        }
    }
    Ok(())
}

fn resolve_column<'m>(map: &'m TypeMap, field: &str) -> BrokerResult<ResolvedColumn<'m>> {
    map.column(field).ok_or_else(|| {
        BrokerError::Mapping(MappingError::new(
            map.entity(),
            field,
            MappingErrorKind::UnknownField,
        ))
    })
}

fn expect_values(
    entity: &str,
    field: &str,
    test: SearchTest,
    values: &[Value],
    expected: usize,
) -> BrokerResult<()> {
    if values.len() == expected {
        return Ok(());
    }
    Err(BrokerError::invariant(
        entity,
        format!(
            "`{}` on `{field}` requires {expected} value(s), got {}",
            test.name(),
            values.len()
        ),
    ))
}

fn comparison_operator(test: SearchTest) -> &'static str {
    match test {
        SearchTest::NotEqual => "<>",
        SearchTest::LessThan => "<",
        SearchTest::LessThanOrEqual => "<=",
        SearchTest::MoreThan => ">",
        SearchTest::MoreThanOrEqual => ">=",
        _ => "=",
    }
}
