#[cfg(test)]
mod tests {
    use quarry_core::{
        FieldDef, Model, ModelBuilder, ModelCache, QueryError, Record, Result, RowLabeled, Value,
    };
    use std::{
        sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
        thread,
    };

    static DESCRIBED: AtomicUsize = AtomicUsize::new(0);

    struct Counter {
        id: i64,
    }

    impl Record for Counter {
        fn describe() -> Model {
            DESCRIBED.fetch_add(1, Ordering::SeqCst);
            ModelBuilder::new("counters")
                .field(FieldDef::new::<i64>("id").primary_key())
                .build()
        }
        fn value(&self, field: &str) -> Option<Value> {
            match field {
                "id" => Some(self.id.into()),
                _ => None,
            }
        }
        fn from_row(row: &RowLabeled) -> Result<Self> {
            Ok(Self { id: row.get("id")? })
        }
    }

    #[test]
    fn model_described_once() {
        let cache = Arc::new(ModelCache::new());
        assert!(cache.is_empty());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || cache.get::<Counter>())
            })
            .collect();
        let models: Vec<_> = threads.into_iter().map(|v| v.join().unwrap()).collect();
        assert_eq!(DESCRIBED.load(Ordering::SeqCst), 1);
        assert!(models.windows(2).all(|v| Arc::ptr_eq(&v[0], &v[1])));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get::<Counter>().name(), "counters");
        assert_eq!(DESCRIBED.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn model_declarations() {
        let model = ModelBuilder::new("orders")
            .field(FieldDef::new::<i64>("id").primary_key().auto_increment())
            .field(FieldDef::new::<i64>("customer_id"))
            .field(FieldDef::new::<String>("code").column("order_code").unique())
            .field(FieldDef::new::<i32>("code"))
            .field(FieldDef::new::<Option<time::OffsetDateTime>>("deleted_at").soft_delete())
            .index("orders_customer", &["customer_id"])
            .index("orders_missing", &["missing"])
            .unique_index("orders_code", &["code", "customer_id"])
            .foreign_key("customer_id", "customers", "id")
            .foreign_key("ghost", "customers", "id")
            .build();
        assert_eq!(model.fields().len(), 4);
        assert_eq!(model.field("code").unwrap().value, Value::Varchar(None));
        assert_eq!(model.field_by_column("order_code").unwrap().name, "code");
        assert_eq!(model.one_primary().unwrap().name, "id");
        assert_eq!(model.indexes().count(), 1);
        assert_eq!(model.unique_indexes().count(), 1);
        assert_eq!(model.foreign_keys().len(), 1);
        assert_eq!(model.foreign_key("customer_id").unwrap().table, "customers");
        let deleted_at = model.soft_delete_field().unwrap();
        assert_eq!(deleted_at.name, "deleted_at");
        assert!(deleted_at.nullable);
        let columns: Vec<_> = model.columns().iter().map(|v| v.to_string()).collect();
        assert_eq!(columns, ["id", "customer_id", "order_code", "deleted_at"]);
    }

    #[test]
    fn model_unknown_field() {
        let model = ModelBuilder::new("things")
            .field(FieldDef::new::<i64>("a").primary_key())
            .field(FieldDef::new::<i64>("b").primary_key())
            .build();
        assert!(model.one_primary().is_none());
        assert_eq!(model.primary_keys().count(), 2);
        let error = model.require_field("c").unwrap_err();
        assert_eq!(
            error.downcast_ref::<QueryError>(),
            Some(&QueryError::UnknownField {
                model: "things".into(),
                field: "c".into()
            })
        );
    }

    #[test]
    fn row_decoding() {
        let row = RowLabeled::new(
            ["id".to_string(), "name".to_string()].into(),
            [Value::Int32(Some(5)), Value::Varchar(None)].into(),
        );
        assert_eq!(Counter::from_row(&row).unwrap().id, 5);
        assert_eq!(row.get::<Option<String>>("name").unwrap(), None);
        assert!(row.get::<String>("name").is_err());
        assert!(row.get::<i64>("missing").is_err());
    }
}
