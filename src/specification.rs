//! Composable query descriptions applied to a `Select` before it is executed.

use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{
    Condition, EntityTrait, IdenStatic, Iterable, Order, QueryFilter, QueryOrder, Select,
};

use crate::pagination::{PageParameters, SortDirection};

pub trait Specification<E: EntityTrait> {
    fn apply(&self, select: Select<E>) -> Select<E>;
}

/// A fixed predicate plus ordering.
pub struct FilterSpec<E: EntityTrait> {
    condition: Condition,
    order: Vec<(E::Column, Order)>,
}

impl<E: EntityTrait> FilterSpec<E> {
    pub fn new(condition: Condition) -> Self {
        Self {
            condition,
            order: Vec::new(),
        }
    }

    pub fn all() -> Self {
        Self::new(Condition::all())
    }

    pub fn order_by(mut self, column: E::Column, order: Order) -> Self {
        self.order.push((column, order));
        self
    }
}

impl<E: EntityTrait> Specification<E> for FilterSpec<E> {
    fn apply(&self, select: Select<E>) -> Select<E> {
        let mut select = select.filter(self.condition.clone());
        for (column, order) in &self.order {
            select = select.order_by(*column, order.clone());
        }
        select
    }
}

/// Translates page parameters into filter and ordering: the free-text search
/// is matched case-insensitively against `search_columns`, and `order_by` is
/// resolved against the entity's own column names. An unknown sort field
/// falls back to the default ordering.
pub struct PagedSpec<E: EntityTrait> {
    base: Condition,
    search_columns: Vec<E::Column>,
    search_text: Option<String>,
    sort: Option<(E::Column, Order)>,
    default_order: Option<(E::Column, Order)>,
}

impl<E: EntityTrait> PagedSpec<E> {
    pub fn new(params: &PageParameters, search_columns: Vec<E::Column>) -> Self {
        let sort = params.sort_order().and_then(|sort| {
            resolve_column::<E>(&sort.field).map(|column| {
                let order = match sort.direction {
                    SortDirection::Asc => Order::Asc,
                    SortDirection::Desc => Order::Desc,
                };
                (column, order)
            })
        });
        if params.order_by.is_some() && sort.is_none() {
            tracing::debug!(order_by = ?params.order_by, "ignoring unknown sort field");
        }
        Self {
            base: Condition::all(),
            search_columns,
            search_text: params.search().map(str::to_lowercase),
            sort,
            default_order: None,
        }
    }

    pub fn with_filter(mut self, condition: Condition) -> Self {
        self.base = self.base.add(condition);
        self
    }

    pub fn with_default_order(mut self, column: E::Column, order: Order) -> Self {
        self.default_order = Some((column, order));
        self
    }
}

impl<E: EntityTrait> Specification<E> for PagedSpec<E> {
    fn apply(&self, select: Select<E>) -> Select<E> {
        let mut select = select.filter(self.base.clone());

        if let Some(text) = &self.search_text {
            if !self.search_columns.is_empty() {
                let pattern = format!("%{}%", escape_like(text));
                let any = self
                    .search_columns
                    .iter()
                    .fold(Condition::any(), |cond, column| {
                        cond.add(
                            Expr::expr(Func::lower(Expr::col((E::default(), *column))))
                                .like(LikeExpr::new(pattern.clone()).escape(LIKE_ESCAPE)),
                        )
                    });
                select = select.filter(any);
            }
        }

        if let Some((column, order)) = self.sort.as_ref().or(self.default_order.as_ref()) {
            select = select.order_by(*column, order.clone());
        }
        select
    }
}

const LIKE_ESCAPE: char = '!';

/// Search text matches literally: `%` and `_` lose their wildcard meaning.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn resolve_column<E: EntityTrait>(field: &str) -> Option<E::Column> {
    E::Column::iter().find(|column| column.as_str() == field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::school_grade;
    use sea_orm::{DbBackend, QueryTrait};

    fn sql(spec: &impl Specification<school_grade::Entity>) -> String {
        spec.apply(school_grade::Entity::find())
            .build(DbBackend::Postgres)
            .to_string()
    }

    #[test]
    fn known_sort_field_is_applied() {
        let params = PageParameters::new(1, 10).with_order_by("Name desc");
        let spec = PagedSpec::<school_grade::Entity>::new(&params, vec![]);
        assert!(sql(&spec).ends_with(r#"ORDER BY "school_grades"."name" DESC"#));
    }

    #[test]
    fn unknown_sort_field_falls_back_to_default_order() {
        let params = PageParameters::new(1, 10).with_order_by("colour desc");
        let spec = PagedSpec::<school_grade::Entity>::new(&params, vec![])
            .with_default_order(school_grade::Column::Id, Order::Asc);
        assert!(sql(&spec).ends_with(r#"ORDER BY "school_grades"."id" ASC"#));
    }

    #[test]
    fn search_text_becomes_case_insensitive_like() {
        let params = PageParameters::new(1, 10).with_search("Grade");
        let spec = PagedSpec::<school_grade::Entity>::new(
            &params,
            vec![school_grade::Column::Name],
        );
        let sql = sql(&spec);
        assert!(sql.contains(r#"LOWER("school_grades"."name") LIKE '%grade%'"#), "{sql}");
    }

    #[test]
    fn wildcards_in_search_text_are_escaped() {
        assert_eq!(escape_like("50%_off!"), "50!%!_off!!");
        let params = PageParameters::new(1, 10).with_search("50%");
        let spec = PagedSpec::<school_grade::Entity>::new(
            &params,
            vec![school_grade::Column::Name],
        );
        let sql = sql(&spec);
        assert!(sql.contains("'%50!%%'"), "{sql}");
        assert!(sql.contains("ESCAPE"), "{sql}");
    }

    #[test]
    fn filter_spec_orders_in_declaration_order() {
        let spec = FilterSpec::<school_grade::Entity>::all()
            .order_by(school_grade::Column::Name, Order::Asc)
            .order_by(school_grade::Column::Id, Order::Desc);
        assert!(sql(&spec)
            .ends_with(r#"ORDER BY "school_grades"."name" ASC, "school_grades"."id" DESC"#));
    }
}
