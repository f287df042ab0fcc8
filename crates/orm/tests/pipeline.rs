//! End-to-end behavior of the memory adapter behind the standard pipeline

use modelkit::{
    Adapter, AdapterContext, DecoratedAdapter, Filter, MemoryAdapter, ModelConfig, Record, Schema,
    TransformerRegistry, ValidatorRegistry, WhereClause,
};
use serde_json::{json, Value};
use std::sync::Arc;

fn record(value: Value) -> Record {
    value.as_object().cloned().unwrap()
}

fn filter(value: Value) -> Option<Filter> {
    Some(Filter::from_json(&value).unwrap())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("modelkit=trace")
        .with_test_writer()
        .try_init();
}

fn build(config: ModelConfig, models: Vec<Value>) -> (DecoratedAdapter, Arc<Schema>) {
    init_tracing();
    let mut schema = Schema::with_config(config);
    for model in &models {
        schema.define_model_json(model).unwrap();
    }
    let schema = Arc::new(schema);
    let adapter = DecoratedAdapter::new(
        MemoryAdapter::new(schema.clone()),
        AdapterContext::new(schema.clone()),
    );
    (adapter, schema)
}

fn setup(models: Vec<Value>) -> DecoratedAdapter {
    build(ModelConfig::default(), models).0
}

fn blog() -> DecoratedAdapter {
    setup(vec![
        json!({
            "name": "user",
            "properties": {"name": "string"},
            "relations": {
                "posts": {"type": "hasMany", "model": "post", "foreignKey": "authorId"},
                "profile": {"type": "hasOne", "model": "profile", "foreignKey": "userId"},
            },
        }),
        json!({
            "name": "profile",
            "properties": {"bio": "string", "userId": "number"},
        }),
        json!({
            "name": "post",
            "properties": {
                "title": "string",
                "authorId": "number",
                "tagsIds": {"type": "array", "itemType": "number"},
            },
            "relations": {
                "author": {"type": "belongsTo", "model": "user", "foreignKey": "authorId"},
                "tags": {"type": "referencesMany", "model": "tag"},
            },
        }),
        json!({
            "name": "tag",
            "properties": {"label": "string"},
        }),
    ])
}

async fn seed_blog(adapter: &DecoratedAdapter) {
    for data in [
        json!({"name": "Ann"}),
        json!({"name": "Bob"}),
        json!({"name": "Cid"}),
    ] {
        adapter.create("user", record(data), None).await.unwrap();
    }
    for data in [json!({"label": "rust"}), json!({"label": "db"}), json!({"label": "web"})] {
        adapter.create("tag", record(data), None).await.unwrap();
    }
    for data in [
        json!({"title": "a1", "authorId": 1, "tagsIds": [3, 1]}),
        json!({"title": "b1", "authorId": 2, "tagsIds": [2]}),
        json!({"title": "a2", "authorId": 1, "tagsIds": []}),
        json!({"title": "a3", "authorId": 1}),
    ] {
        adapter.create("post", record(data), None).await.unwrap();
    }
    adapter
        .create("profile", record(json!({"bio": "hello", "userId": 2})), None)
        .await
        .unwrap();
}

fn titles(value: &Value) -> Vec<String> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|post| post["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_create_applies_defaults_and_generates_ids() {
    let adapter = setup(vec![json!({
        "name": "model",
        "properties": {"foo": {"type": "number", "default": 10}},
    })]);

    let first = adapter.create("model", Record::new(), None).await.unwrap();
    assert_eq!(Value::Object(first), json!({"id": 1, "foo": 10}));

    let second = adapter.create("model", record(json!({"foo": 5})), None).await.unwrap();
    assert_eq!(Value::Object(second), json!({"id": 2, "foo": 5}));
}

#[tokio::test]
async fn test_find_with_where_order_and_limit() {
    let adapter = setup(vec![json!({
        "name": "model",
        "properties": {"foo": "number"},
    })]);
    for foo in [3, 1, 7, 5] {
        adapter.create("model", record(json!({"foo": foo})), None).await.unwrap();
    }

    let found = adapter
        .find(
            "model",
            filter(json!({"where": {"foo": {"gte": 3}}, "order": "foo DESC", "limit": 2})),
        )
        .await
        .unwrap();
    let foos: Vec<_> = found.iter().map(|row| row["foo"].clone()).collect();
    assert_eq!(foos, vec![json!(7), json!(5)]);
}

#[tokio::test]
async fn test_find_highest_of_defaulted_rows() {
    let adapter = setup(vec![json!({
        "name": "model",
        "properties": {"foo": {"type": "number", "default": 10}},
    })]);
    adapter.create("model", Record::new(), None).await.unwrap();
    adapter.create("model", record(json!({"foo": 15})), None).await.unwrap();
    adapter.create("model", record(json!({"foo": 20})), None).await.unwrap();

    let found = adapter
        .find(
            "model",
            filter(json!({"where": {"foo": {"gte": 15}}, "order": "foo DESC", "limit": 1})),
        )
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(Value::Object(found[0].clone()), json!({"id": 3, "foo": 20}));
}

#[tokio::test]
async fn test_invalid_data_has_no_side_effect() {
    let adapter = setup(vec![json!({
        "name": "model",
        "properties": {"foo": {"type": "number", "required": true}},
    })]);

    let err = adapter
        .create("model", record(json!({"foo": "bar"})), None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "The property \"foo\" of the model \"model\" must have a Number, but \"bar\" given."
    );
    assert_eq!(adapter.count("model", None).await.unwrap(), 0);

    let err = adapter.create("model", Record::new(), None).await.unwrap_err();
    assert!(err.to_string().contains("is required, but undefined given"));
    assert_eq!(adapter.count("model", None).await.unwrap(), 0);
}

#[tokio::test]
async fn test_patch_does_not_require_absent_properties() {
    let adapter = setup(vec![json!({
        "name": "model",
        "properties": {
            "foo": {"type": "string", "required": true},
            "bar": "number",
        },
    })]);
    let created = adapter
        .create("model", record(json!({"foo": "a", "bar": 1})), None)
        .await
        .unwrap();

    let patched = adapter
        .patch_by_id("model", created["id"].clone(), record(json!({"bar": 2})), None)
        .await
        .unwrap();
    assert_eq!(Value::Object(patched), json!({"id": 1, "foo": "a", "bar": 2}));

    let err = adapter
        .patch_by_id("model", json!(1), record(json!({"foo": null})), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("is required, but null given"));
}

#[tokio::test]
async fn test_created_record_equals_found_record() {
    let adapter = setup(vec![json!({
        "name": "model",
        "properties": {"foo": "string", "bar": {"type": "boolean", "default": false}},
    })]);
    let created = adapter
        .create("model", record(json!({"foo": "x"})), None)
        .await
        .unwrap();
    let found = adapter
        .find_by_id("model", created["id"].clone(), None)
        .await
        .unwrap();
    assert_eq!(created, found);
}

#[tokio::test]
async fn test_strict_and_sparse_uniqueness() {
    let adapter = setup(vec![json!({
        "name": "model",
        "properties": {
            "code": {"type": "string", "unique": true},
            "email": {"type": "string", "unique": "sparse"},
        },
    })]);

    adapter
        .create("model", record(json!({"code": "a", "email": "a@x"})), None)
        .await
        .unwrap();

    let err = adapter
        .create("model", record(json!({"code": "a"})), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already has the property \"code\""));

    let err = adapter
        .create("model", record(json!({"code": "b", "email": "a@x"})), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("already has the property \"email\""));

    // sparse skips empty values, strict does not
    adapter
        .create("model", record(json!({"code": "b"})), None)
        .await
        .unwrap();
    adapter
        .create("model", record(json!({"code": "c"})), None)
        .await
        .unwrap();
    adapter.create("model", Record::new(), None).await.unwrap();
    let err = adapter.create("model", Record::new(), None).await.unwrap_err();
    assert!(err.to_string().contains("\"code\" with the value null"));

    // replacing a record with its own value is allowed
    adapter
        .replace_by_id("model", json!(1), record(json!({"code": "a", "email": "a@x"})), None)
        .await
        .unwrap();

    // a patch assigning one value to several records is rejected
    let err = adapter
        .patch(
            "model",
            record(json!({"code": "z"})),
            Some(WhereClause::from_json(&json!({"id": {"inq": [2, 3]}})).unwrap()),
        )
        .await
        .unwrap_err();
    assert!(err.to_string().contains("to 2 documents"));
}

#[tokio::test]
async fn test_fields_keep_primary_key() {
    let adapter = setup(vec![json!({
        "name": "model",
        "properties": {"foo": "string", "bar": "string"},
    })]);
    adapter
        .create("model", record(json!({"foo": "a", "bar": "b"})), None)
        .await
        .unwrap();

    let found = adapter
        .find("model", filter(json!({"fields": ["foo"]})))
        .await
        .unwrap();
    assert_eq!(Value::Object(found[0].clone()), json!({"id": 1, "foo": "a"}));

    let created = adapter
        .create("model", record(json!({"foo": "c", "bar": "d"})), filter(json!({"fields": "bar"})))
        .await
        .unwrap();
    assert_eq!(Value::Object(created), json!({"id": 2, "bar": "d"}));
}

#[tokio::test]
async fn test_transformers_and_validators_run_in_the_pipeline() {
    init_tracing();
    let mut schema = Schema::new();
    schema
        .define_model_json(&json!({
            "name": "user",
            "properties": {
                "email": {
                    "type": "string",
                    "transform": ["trim", "toLowerCase"],
                    "validate": ["corporate"],
                },
                "nick": {"type": "string", "transform": "shout", "validate": {"maxLength": 6}},
            },
        }))
        .unwrap();
    let schema = Arc::new(schema);

    let mut validators = ValidatorRegistry::new();
    validators.add("corporate", |value, _, _| {
        Ok(value.as_str().is_some_and(|email| email.ends_with("@corp.io")))
    });
    let mut transformers = TransformerRegistry::new();
    transformers.add_fn("shout", |value, _, _| {
        Ok(match value {
            Value::String(text) => Value::String(format!("{}!", text)),
            other => other,
        })
    });

    let adapter = DecoratedAdapter::new(
        MemoryAdapter::new(schema.clone()),
        AdapterContext::new(schema)
            .with_validators(validators)
            .with_transformers(transformers),
    );

    let created = adapter
        .create("user", record(json!({"email": "  Ann@Corp.IO ", "nick": "ann"})), None)
        .await
        .unwrap();
    assert_eq!(created["email"], json!("ann@corp.io"));
    assert_eq!(created["nick"], json!("ann!"));

    // validators see transformed values
    let err = adapter
        .create("user", record(json!({"email": "bob@corp.io", "nick": "bobby!"})), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("caught by the validator \"maxLength\""));

    let err = adapter
        .create("user", record(json!({"email": "bob@home.io"})), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("caught by the validator \"corporate\""));
}

#[tokio::test]
async fn test_relation_keys_are_stripped_from_writes() {
    let adapter = blog();
    let created = adapter
        .create(
            "post",
            record(json!({"title": "t", "authorId": 1, "author": {"name": "x"}})),
            None,
        )
        .await
        .unwrap();
    assert!(!created.contains_key("author"));
    assert_eq!(created["authorId"], json!(1));
}

#[tokio::test]
async fn test_include_belongs_to() {
    let adapter = blog();
    seed_blog(&adapter).await;

    let posts = adapter
        .find("post", filter(json!({"include": "author", "order": "id"})))
        .await
        .unwrap();
    assert_eq!(posts[0]["author"], json!({"id": 1, "name": "Ann"}));
    assert_eq!(posts[1]["author"], json!({"id": 2, "name": "Bob"}));
}

#[tokio::test]
async fn test_include_has_one_and_has_many() {
    let adapter = blog();
    seed_blog(&adapter).await;

    let users = adapter
        .find("user", filter(json!({"include": ["posts", "profile"], "order": "id"})))
        .await
        .unwrap();

    assert_eq!(titles(&users[0]["posts"]), vec!["a1", "a2", "a3"]);
    assert_eq!(titles(&users[1]["posts"]), vec!["b1"]);
    assert_eq!(users[2]["posts"], json!([]));

    assert!(!users[0].contains_key("profile"));
    assert_eq!(users[1]["profile"]["bio"], json!("hello"));
}

#[tokio::test]
async fn test_include_scope_applies_per_owner() {
    let adapter = blog();
    seed_blog(&adapter).await;

    let users = adapter
        .find(
            "user",
            filter(json!({
                "where": {"id": {"inq": [1, 2]}},
                "order": "id",
                "include": {
                    "relation": "posts",
                    "scope": {
                        "where": {"title": {"neq": "a2"}},
                        "order": "title DESC",
                        "fields": ["title"],
                        "limit": 1,
                    },
                },
            })),
        )
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["posts"], json!([{"id": 4, "title": "a3"}]));
    assert_eq!(users[1]["posts"], json!([{"id": 2, "title": "b1"}]));
}

#[tokio::test]
async fn test_include_references_many_follows_id_order() {
    let adapter = blog();
    seed_blog(&adapter).await;

    let post = adapter
        .find_by_id("post", json!(1), filter(json!({"include": "tags"})))
        .await
        .unwrap();
    let labels: Vec<_> = post["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tag| tag["label"].clone())
        .collect();
    assert_eq!(labels, vec![json!("web"), json!("rust")]);

    let post = adapter
        .find_by_id(
            "post",
            json!(1),
            filter(json!({"include": {"relation": "tags", "scope": {"order": "label"}}})),
        )
        .await
        .unwrap();
    let labels: Vec<_> = post["tags"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tag| tag["label"].clone())
        .collect();
    assert_eq!(labels, vec![json!("rust"), json!("web")]);

    let post = adapter
        .find_by_id("post", json!(4), filter(json!({"include": "tags"})))
        .await
        .unwrap();
    assert_eq!(post["tags"], json!([]));
}

#[tokio::test]
async fn test_nested_include() {
    let adapter = blog();
    seed_blog(&adapter).await;

    let post = adapter
        .find_by_id(
            "post",
            json!(2),
            filter(json!({"include": {"author": {"profile": null}}})),
        )
        .await
        .unwrap();
    assert_eq!(post["author"]["name"], json!("Bob"));
    assert_eq!(post["author"]["profile"]["bio"], json!("hello"));
}

#[tokio::test]
async fn test_include_with_fields_keeps_relation() {
    let adapter = blog();
    seed_blog(&adapter).await;

    let posts = adapter
        .find(
            "post",
            filter(json!({"where": {"id": 1}, "fields": ["title"], "include": "author"})),
        )
        .await
        .unwrap();
    assert_eq!(
        Value::Object(posts[0].clone()),
        json!({"id": 1, "title": "a1", "author": {"id": 1, "name": "Ann"}})
    );
}

#[tokio::test]
async fn test_include_depth_is_limited() {
    let (adapter, _) = build(
        ModelConfig::default().with_max_include_depth(1),
        vec![json!({
            "name": "node",
            "properties": {"parentId": "number"},
            "relations": {"parent": {"type": "belongsTo", "model": "node"}},
        })],
    );
    adapter.create("node", Record::new(), None).await.unwrap();
    adapter
        .create("node", record(json!({"parentId": 1})), None)
        .await
        .unwrap();
    adapter
        .create("node", record(json!({"parentId": 2})), None)
        .await
        .unwrap();

    let node = adapter
        .find_by_id("node", json!(3), filter(json!({"include": "parent"})))
        .await
        .unwrap();
    assert_eq!(node["parent"]["id"], json!(2));

    let err = adapter
        .find_by_id("node", json!(3), filter(json!({"include": {"parent": "parent"}})))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("nested deeper than 1 levels"));
}

#[tokio::test]
async fn test_unknown_relation_is_rejected() {
    let adapter = blog();
    let err = adapter
        .find("post", filter(json!({"include": "comments"})))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("comments"));
}

#[tokio::test]
async fn test_delete_and_exists() {
    let adapter = blog();
    seed_blog(&adapter).await;

    assert!(adapter.exists("post", json!(1)).await.unwrap());
    assert!(adapter.delete_by_id("post", json!(1)).await.unwrap());
    assert!(!adapter.exists("post", json!(1)).await.unwrap());
    assert!(!adapter.delete_by_id("post", json!(1)).await.unwrap());

    let deleted = adapter
        .delete("post", Some(WhereClause::eq("authorId", json!(1))))
        .await
        .unwrap();
    assert_eq!(deleted, 2);
    assert_eq!(adapter.count("post", None).await.unwrap(), 1);
}

#[tokio::test]
async fn test_object_form_chains_run_in_declaration_order() {
    init_tracing();
    let mut schema = Schema::new();
    schema
        .define_model_json(&json!({
            "name": "model",
            "properties": {
                "code": {"type": "string", "transform": {"toUpperCase": null, "addSuffix": "x"}},
                "name": {"type": "string", "validate": {"minLength": 10, "maxLength": 2}},
            },
        }))
        .unwrap();
    let schema = Arc::new(schema);

    let mut transformers = TransformerRegistry::new();
    transformers.add_fn("addSuffix", |value, options, _| {
        Ok(match (value, options.as_str()) {
            (Value::String(text), Some(suffix)) => Value::String(format!("{}{}", text, suffix)),
            (other, _) => other,
        })
    });
    let adapter = DecoratedAdapter::new(
        MemoryAdapter::new(schema.clone()),
        AdapterContext::new(schema).with_transformers(transformers),
    );

    let created = adapter
        .create("model", record(json!({"code": "abc"})), None)
        .await
        .unwrap();
    assert_eq!(created["code"], json!("ABCx"));

    let err = adapter
        .create("model", record(json!({"name": "abcde"})), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("caught by the validator \"minLength\""));
}
