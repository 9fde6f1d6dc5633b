use crate::{
    Clauses, Context, FieldDef, Loader, Model, ModelCache, QueryError, Record, ReportIndex,
    Result, SearchList, Value, future::BoxFuture,
};
use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    /// The child holds the key of the parent, at most one child per parent.
    OneToOne,
    /// The parent holds the key of the child.
    BelongsTo,
    /// The child holds the key of the parent.
    OneToMany,
    /// A join table holds the keys of both sides.
    ManyToMany,
}

/// Setter storing the resolved children in the container of the parent.
pub enum Attach<P, C> {
    One(fn(&mut P, Option<C>)),
    Many(fn(&mut P, Vec<C>)),
}

impl<P, C> Clone for Attach<P, C> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<P, C> Copy for Attach<P, C> {}

/// Join table of a many to many relation.
#[derive(Clone, Copy)]
pub struct JoinTable {
    pub model: fn(&ModelCache) -> Arc<Model>,
    /// Field of the join model holding the parent key.
    pub parent: &'static str,
    /// Field of the join model holding the child key.
    pub child: &'static str,
}

/// Relation of `P` towards `C` resolved after `P` records are loaded.
///
/// Keys are Rust field names, `None` stands for the primary key of the model.
pub struct Relation<P, C> {
    pub kind: RelationKind,
    pub container: &'static str,
    pub parent_key: Option<&'static str>,
    pub child_key: Option<&'static str>,
    pub join: Option<JoinTable>,
    pub attach: Attach<P, C>,
    pub preload: Preload<C>,
}

impl<P: Record, C: Record + Clone> Relation<P, C> {
    fn new(
        kind: RelationKind,
        container: &'static str,
        parent_key: Option<&'static str>,
        child_key: Option<&'static str>,
        attach: Attach<P, C>,
    ) -> Self {
        Self {
            kind,
            container,
            parent_key,
            child_key,
            join: None,
            attach,
            preload: Preload::new(),
        }
    }

    /// `child_key` of `C` references the primary key of `P`.
    pub fn one_to_one(
        container: &'static str,
        child_key: &'static str,
        attach: fn(&mut P, Option<C>),
    ) -> Self {
        Self::new(
            RelationKind::OneToOne,
            container,
            None,
            Some(child_key),
            Attach::One(attach),
        )
    }

    /// `child_key` of `C` references the primary key of `P`.
    pub fn one_to_many(
        container: &'static str,
        child_key: &'static str,
        attach: fn(&mut P, Vec<C>),
    ) -> Self {
        Self::new(
            RelationKind::OneToMany,
            container,
            None,
            Some(child_key),
            Attach::Many(attach),
        )
    }

    /// `parent_key` of `P` references the primary key of `C`.
    pub fn belongs_to(
        container: &'static str,
        parent_key: &'static str,
        attach: fn(&mut P, Option<C>),
    ) -> Self {
        Self::new(
            RelationKind::BelongsTo,
            container,
            Some(parent_key),
            None,
            Attach::One(attach),
        )
    }

    /// The join model `J` pairs the primary keys of `P` and `C`.
    pub fn many_to_many<J: Record>(
        container: &'static str,
        join_parent: &'static str,
        join_child: &'static str,
        attach: fn(&mut P, Vec<C>),
    ) -> Self {
        let mut relation = Self::new(
            RelationKind::ManyToMany,
            container,
            None,
            None,
            Attach::Many(attach),
        );
        relation.join = Some(JoinTable {
            model: ModelCache::get::<J>,
            parent: join_parent,
            child: join_child,
        });
        relation
    }

    /// Preload `relation` on the children of this one.
    pub fn with(mut self, relation: impl PreloadNode<C> + 'static) -> Self {
        self.preload = self.preload.with(relation);
        self
    }

    async fn try_resolve(
        &self,
        loader: &mut Loader<'_>,
        parents: &mut [P],
        index: &ReportIndex,
    ) -> Result<()> {
        let parent_model = loader.models().get::<P>();
        let child_model = loader.models().get::<C>();
        let parent_field = key_field(&parent_model, self.parent_key)?;
        let keys: Vec<Option<Value>> = parents
            .iter()
            .map(|v| {
                v.value(parent_field.name)
                    .map(|v| v.key())
                    .filter(|v| !v.is_null())
            })
            .collect();
        let parent_keys = distinct(keys.iter().flatten().cloned());
        if parent_keys.is_empty() {
            log::debug!(
                "No {} key to preload {} with",
                parent_model.name(),
                self.container
            );
            return Ok(());
        }
        if let Some(join) = &self.join {
            return self
                .resolve_join(loader, join, &child_model, parents, &keys, parent_keys, index)
                .await;
        }
        let child_field = key_field(&child_model, self.child_key)?;
        let children = self
            .load(loader, &child_model, child_field, parent_keys, index)
            .await?;
        let mut groups = HashMap::<Value, Vec<usize>>::new();
        for (i, child) in children.iter().enumerate() {
            if let Some(key) = child.value(child_field.name).map(|v| v.key()) {
                groups.entry(key).or_default().push(i);
            }
        }
        for (parent, key) in parents.iter_mut().zip(&keys) {
            let matched = key.as_ref().and_then(|v| groups.get(v));
            match self.attach {
                Attach::One(attach) => attach(
                    parent,
                    matched
                        .and_then(|v| v.first())
                        .map(|&i| children[i].clone()),
                ),
                Attach::Many(attach) => attach(
                    parent,
                    matched
                        .map(|v| v.iter().map(|&i| children[i].clone()).collect())
                        .unwrap_or_default(),
                ),
            }
        }
        Ok(())
    }

    /// Children whose `field` is one of `keys`, with their own relations resolved.
    async fn load(
        &self,
        loader: &mut Loader<'_>,
        model: &Model,
        field: &FieldDef,
        keys: Vec<Value>,
        index: &ReportIndex,
    ) -> Result<Vec<C>> {
        let rows = loader
            .find_rows(
                index,
                model,
                SearchList::in_list(field.column.clone(), keys),
                &Clauses::default(),
            )
            .await?;
        let mut children = rows.iter().map(C::from_row).collect::<Result<Vec<_>>>()?;
        self.preload.resolve(loader, &mut children, index).await;
        Ok(children)
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve_join(
        &self,
        loader: &mut Loader<'_>,
        join: &JoinTable,
        child_model: &Model,
        parents: &mut [P],
        keys: &[Option<Value>],
        distinct_keys: Vec<Value>,
        index: &ReportIndex,
    ) -> Result<()> {
        let join_model = (join.model)(loader.models());
        let join_parent = join_model.require_field(join.parent)?;
        let join_child = join_model.require_field(join.child)?;
        let search = loader.scope(
            &join_model,
            SearchList::in_list(join_parent.column.clone(), distinct_keys),
        );
        let exec = loader
            .dialect()
            .write_find(
                &join_model,
                &[join_parent.column.clone(), join_child.column.clone()],
            )
            .concat(
                loader
                    .dialect()
                    .write_condition(&search, &Clauses::default())?,
            );
        let pairs: Vec<(Value, Value)> = loader
            .fetch(index, exec)
            .await
            .with_context(|| format!("While loading the join table {}", join_model.name()))?
            .iter()
            .filter_map(|row| {
                let parent = row.get_column(join_parent.column.name())?.key();
                let child = row.get_column(join_child.column.name())?.key();
                (!parent.is_null() && !child.is_null()).then_some((parent, child))
            })
            .collect();
        let child_keys = distinct(pairs.iter().map(|(_, v)| v.clone()));
        let children: Vec<(Value, C)> = if child_keys.is_empty() {
            Vec::new()
        } else {
            let child_field = key_field(child_model, None)?;
            let children = self
                .load(loader, child_model, child_field, child_keys, index)
                .await
                .with_context(|| {
                    format!(
                        "While loading {} through {}",
                        child_model.name(),
                        join_model.name()
                    )
                })?;
            children
                .into_iter()
                .filter_map(|v| Some((v.value(child_field.name)?.key(), v)))
                .collect()
        };
        let children: HashMap<Value, C> = children.into_iter().rev().collect();
        let mut pairs_of = HashMap::<&Value, Vec<&Value>>::new();
        for (parent, child) in &pairs {
            pairs_of.entry(parent).or_default().push(child);
        }
        for (parent, key) in parents.iter_mut().zip(keys) {
            let matched: Vec<C> = key
                .as_ref()
                .and_then(|v| pairs_of.get(v))
                .map(|v| v.iter().filter_map(|k| children.get(*k).cloned()).collect())
                .unwrap_or_default();
            match self.attach {
                Attach::Many(attach) => attach(parent, matched),
                Attach::One(attach) => attach(parent, matched.into_iter().next()),
            }
        }
        Ok(())
    }
}

/// Field named `key` or the single primary key of `model`.
fn key_field<'m>(model: &'m Model, key: Option<&str>) -> Result<&'m FieldDef> {
    match key {
        Some(key) => model.require_field(key),
        None => model.one_primary().ok_or_else(|| {
            QueryError::UnknownField {
                model: model.name().into(),
                field: "primary key".into(),
            }
            .into()
        }),
    }
}

/// Values in first appearance order without repetitions.
fn distinct(values: impl Iterator<Item = Value>) -> Vec<Value> {
    let mut seen = HashSet::new();
    values.filter(|v| seen.insert(v.clone())).collect()
}

/// Relation that can be resolved on a slice of `P` records.
pub trait PreloadNode<P>: Send + Sync {
    /// Name of the field receiving the children.
    fn container(&self) -> &'static str;

    /// Load and attach the children, failures are stored in the report of the loader.
    fn resolve<'a>(
        &'a self,
        loader: &'a mut Loader<'_>,
        parents: &'a mut [P],
        index: ReportIndex,
    ) -> BoxFuture<'a, ()>;
}

impl<P: Record, C: Record + Clone> PreloadNode<P> for Relation<P, C> {
    fn container(&self) -> &'static str {
        self.container
    }

    fn resolve<'a>(
        &'a self,
        loader: &'a mut Loader<'_>,
        parents: &'a mut [P],
        index: ReportIndex,
    ) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            if let Err(e) = self.try_resolve(loader, parents, &index).await {
                loader.report_mut().fail(index, &e);
            }
        })
    }
}

/// Relations to resolve on a set of records, node `i` is reported at `index-i`.
///
/// A many to many node runs two statements under the same index, the join
/// table query and then the child query. Its failure message names the step.
pub struct Preload<P> {
    nodes: Vec<Box<dyn PreloadNode<P>>>,
}

impl<P> Preload<P> {
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }
    pub fn with(mut self, node: impl PreloadNode<P> + 'static) -> Self {
        self.nodes.push(Box::new(node));
        self
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn containers(&self) -> impl Iterator<Item = &'static str> {
        self.nodes.iter().map(|v| v.container())
    }

    pub(crate) async fn resolve(
        &self,
        loader: &mut Loader<'_>,
        parents: &mut [P],
        index: &ReportIndex,
    ) {
        if parents.is_empty() {
            return;
        }
        for (i, node) in self.nodes.iter().enumerate() {
            node.resolve(loader, parents, index.child(i)).await;
        }
    }
}

impl<P> Default for Preload<P> {
    fn default() -> Self {
        Self::new()
    }
}
