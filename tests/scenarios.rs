//! End-to-end scenario tests (spec.md §8, S1-S6), each driving a plugin (or
//! the validator DSL) against the exact verbatim input the scenario
//! specifies.

use apiscope::plugins::{elysia::ElysiaPlugin, express::ExpressPlugin, nestjs::NestJsPlugin, rails::RailsPlugin, tapir::TapirPlugin};
use apiscope::FrameworkPlugin;
use apiscope_ir::{Language, Method, SourceFile};

#[test]
fn s1_elysia_chained_routes() {
    let source = "import { Elysia, t } from 'elysia'\n\
        const app = new Elysia()\n\
        .get('/users', () => [])\n\
        .get('/users/:id', () => ({}))\n\
        .post('/users', ({ body }) => ({}), { body: t.Object({ name: t.String(), email: t.String() }) })\n\
        .delete('/users/:id', () => {})\n";
    let files = vec![SourceFile::new("app.ts", Language::TypeScript, source)];
    let routes = ElysiaPlugin.extract_routes(&files);

    assert!(routes.iter().any(|r| r.path == "/users" && r.method == Method::Get));
    let get_by_id = routes.iter().find(|r| r.path == "/users/{id}" && r.method == Method::Get).unwrap();
    assert!(get_by_id.parameters.iter().any(|p| p.name == "id" && p.required));
    assert!(routes.iter().any(|r| r.path == "/users/{id}" && r.method == Method::Delete));

    let post = routes.iter().find(|r| r.method == Method::Post).unwrap();
    let body = post.request_body.as_ref().expect("request body");
    let schema = &body.content.get("application/json").unwrap().schema;
    assert!(schema.properties.contains_key("name"));
    assert!(schema.properties.contains_key("email"));
    assert!(body.required);

    assert!(routes.iter().all(|r| r.tags == vec!["users".to_string()]));
}

#[test]
fn s2_express_mounted_router() {
    let source = "const express=require('express'); const app=express(); const r=express.Router();\n\
        app.use('/api', r); r.get('/items/:id', h); r.post('/items', h);";
    let files = vec![SourceFile::new("app.ts", Language::TypeScript, source)];
    let routes = ExpressPlugin.extract_routes(&files);

    let get_item = routes.iter().find(|r| r.method == Method::Get).unwrap();
    assert_eq!(get_item.path, "/api/items/{id}");
    assert!(get_item.parameters.iter().any(|p| p.name == "id"));

    let post_item = routes.iter().find(|r| r.method == Method::Post).unwrap();
    assert_eq!(post_item.path, "/api/items");

    assert!(routes.iter().all(|r| r.tags == vec!["items".to_string()]));
}

#[test]
fn s3_rails_namespace_and_resources() {
    let source = "Rails.application.routes.draw do\n\
        \u{20}namespace :api do\n\
        \u{20}\u{20}namespace :v1 do\n\
        \u{20}\u{20}\u{20}get '/products', to: 'products#index'\n\
        \u{20}\u{20}\u{20}resources :orders, only: [:index, :show]\n\
        \u{20}\u{20}end\n\
        \u{20}end\n\
        end\n";
    let files = vec![SourceFile::new("config/routes.rb", Language::Ruby, source)];
    let routes = RailsPlugin.extract_routes(&files);

    assert!(routes.iter().any(|r| r.path == "/api/v1/products" && r.handler == "products#index"));
    assert!(routes.iter().any(|r| r.path == "/api/v1/orders" && r.method == Method::Get));
    assert!(routes.iter().any(|r| r.path == "/api/v1/orders/{id}" && r.method == Method::Get));
    assert!(!routes.iter().any(|r| r.handler == "orders#destroy"));
}

#[test]
fn s4_nestjs_controller_with_decorators() {
    let source = "@Controller({ path: 'items', version: '1' })\n\
        export class ItemsController {\n\
        \u{20}@Get() findAll() {}\n\
        \u{20}@Get(':id') findOne(@Param('id') id: string) {}\n\
        \u{20}@Post() @HttpCode(201) create(@Body() dto: CreateItemDto) {}\n\
        }\n";
    let files = vec![SourceFile::new("items.controller.ts", Language::TypeScript, source)];
    let routes = NestJsPlugin.extract_routes(&files);

    let find_all = routes.iter().find(|r| r.handler.ends_with("findAll")).unwrap();
    assert_eq!(find_all.path, "/v1/items");
    assert_eq!(find_all.tags, vec!["items".to_string()]);

    let find_one = routes.iter().find(|r| r.handler.ends_with("findOne")).unwrap();
    assert_eq!(find_one.path, "/v1/items/{id}");

    let create = routes.iter().find(|r| r.handler.ends_with("create")).unwrap();
    assert_eq!(create.path, "/v1/items");
    assert_eq!(create.method, Method::Post);
    let body = create.request_body.as_ref().unwrap();
    assert_eq!(
        body.content.get("application/json").unwrap().schema.r#ref.as_deref(),
        Some("#/components/schemas/CreateItemDto")
    );
    assert!(create.responses.as_ref().unwrap().contains_key("201"));
}

#[test]
fn s5_tapir_path_and_query() {
    let source = "val getUser = endpoint.get.in(\"users\" / path[Long](\"id\")).out(jsonBody[User])\n\
        val search = endpoint.get.in(\"search\").in(query[String](\"q\")).in(query[Option[Int]](\"limit\"))\n";
    let files = vec![SourceFile::new("Routes.scala", Language::Scala, source)];
    let routes = TapirPlugin.extract_routes(&files);

    let get_user = routes.iter().find(|r| r.path == "/users/{id}").unwrap();
    let id_param = get_user.parameters.iter().find(|p| p.name == "id").unwrap();
    assert_eq!(id_param.schema.format.as_deref(), Some("int64"));

    let search = routes.iter().find(|r| r.path == "/search").unwrap();
    let q = search.parameters.iter().find(|p| p.name == "q").unwrap();
    assert!(q.required);
    let limit = search.parameters.iter().find(|p| p.name == "limit").unwrap();
    assert!(!limit.required);
}

#[test]
fn s6_validator_combinator_schema() {
    use apiscope_ir::validator_dsl::{ChainArg, ChainCall};

    let chain = ChainCall::new("z").call(
        "object",
        vec![ChainArg::Object(vec![
            ("id".to_string(), ChainCall::new("z").call("string", vec![]).call("uuid", vec![])),
            (
                "name".to_string(),
                ChainCall::new("z")
                    .call("string", vec![])
                    .call("min", vec![ChainArg::Num(1.0)])
                    .call("max", vec![ChainArg::Num(100.0)]),
            ),
            ("email".to_string(), ChainCall::new("z").call("string", vec![]).call("email", vec![])),
            (
                "age".to_string(),
                ChainCall::new("z")
                    .call("number", vec![])
                    .call("int", vec![])
                    .call("positive", vec![])
                    .call("optional", vec![]),
            ),
        ])],
    );

    let schema = apiscope_ir::validator_dsl::interpret(&chain);

    assert_eq!(schema.required, vec!["id".to_string(), "name".to_string(), "email".to_string()]);
    assert_eq!(schema.properties["id"].format.as_deref(), Some("uuid"));
    assert_eq!(schema.properties["name"].min_length, Some(1));
    assert_eq!(schema.properties["name"].max_length, Some(100));
    assert_eq!(schema.properties["email"].format.as_deref(), Some("email"));
    assert_eq!(schema.properties["age"].minimum, Some(1.0));
}
