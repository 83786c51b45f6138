use std::path::{Path, PathBuf};

use fetchgen_compiler::{Compiler, CompilerConfig, CompilerError, InputSource};

const ORDER_API: &str = r##"{
  "openapi": "3.0.1",
  "info": { "title": "Order Service", "version": "1.0.0" },
  "x-wow-context-alias": "example",
  "tags": [
    { "name": "example.order", "description": "Order aggregate" },
    { "name": "health" }
  ],
  "paths": {
    "/tenant/{tenantId}/order": {
      "post": {
        "operationId": "example.order.create_order",
        "tags": ["example.order"],
        "requestBody": {
          "required": true,
          "content": { "application/json": { "schema": { "$ref": "#/components/schemas/example.order.CreateOrder" } } }
        },
        "responses": { "200": { "description": "ok" } }
      }
    },
    "/tenant/{tenantId}/order/{id}/state": {
      "get": {
        "operationId": "example.order.getState",
        "tags": ["example.order"],
        "responses": {
          "200": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/example.order.OrderState" } } } }
        }
      }
    },
    "/health": {
      "get": {
        "operationId": "health.check",
        "tags": ["health"],
        "responses": {
          "200": { "content": { "application/json": { "schema": { "type": "string" } } } }
        }
      }
    }
  },
  "components": {
    "schemas": {
      "example.common.Money": {
        "type": "object",
        "required": ["amount", "currency"],
        "properties": {
          "amount": { "type": "number" },
          "currency": { "type": "string" }
        }
      },
      "example.order.OrderStatus": {
        "title": "Order status",
        "type": "string",
        "enum": ["PENDING", "PAID", "SHIPPED"]
      },
      "example.order.OrderItem": {
        "type": "object",
        "properties": {
          "sku": { "type": "string" },
          "price": { "$ref": "#/components/schemas/example.common.Money" }
        }
      },
      "example.order.OrderState": {
        "type": "object",
        "required": ["id", "status"],
        "properties": {
          "id": { "type": "string" },
          "status": { "$ref": "#/components/schemas/example.order.OrderStatus" },
          "items": { "type": "array", "items": { "$ref": "#/components/schemas/example.order.OrderItem" } },
          "total": { "$ref": "#/components/schemas/example.common.Money" }
        }
      },
      "example.order.CreateOrder": {
        "type": "object",
        "properties": {
          "items": { "type": "array", "items": { "$ref": "#/components/schemas/example.order.OrderItem" } }
        }
      },
      "example.order.OrderCreated": { "type": "object", "properties": { "id": { "type": "string" } } },
      "example.order.OrderDomainEvent": {
        "oneOf": [{ "$ref": "#/components/schemas/example.order.OrderCreated" }]
      },
      "wow.api.query.ListQuery": { "type": "object" }
    }
  }
}"##;

fn compiler(out_dir: &Path, dry_run: bool) -> Compiler {
    Compiler::new(CompilerConfig {
        input: InputSource::Path(PathBuf::from("openapi.json")),
        out_dir: out_dir.to_path_buf(),
        dry_run,
        ..Default::default()
    })
}

fn read(out_dir: &Path, file: &str) -> String {
    std::fs::read_to_string(out_dir.join(file)).unwrap()
}

#[test]
fn generates_models_and_clients() {
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("generated");

    let result = compiler(&out, false)
        .compile_text(ORDER_API, "openapi.json")
        .unwrap();

    assert_eq!(result.models, 7);
    assert_eq!(result.aggregates, 1);
    assert_eq!(result.api_clients, 1);
    assert!(result.skipped.is_empty());
    for file in [
        "example/common/types.ts",
        "example/order/types.ts",
        "example/order/queryClient.ts",
        "example/order/commandClient.ts",
        "example/HealthApiClient.ts",
    ] {
        assert!(result.files.iter().any(|f| f == file), "missing {file}");
        assert!(out.join(file).is_file(), "not written: {file}");
    }
    assert_eq!(result.files.len(), 5);
}

#[test]
fn enum_model_output() {
    let dir = tempfile::TempDir::new().unwrap();
    compiler(dir.path(), false)
        .compile_text(ORDER_API, "openapi.json")
        .unwrap();

    let types = read(dir.path(), "example/order/types.ts");
    assert!(types.starts_with("// Generated by fetchgen. Do not edit.\n"));
    assert!(types.contains(
        "/**\n * Order status\n */\nexport enum OrderStatus {\n  PENDING = 'PENDING',\n  PAID = 'PAID',\n  SHIPPED = 'SHIPPED',\n}\n"
    ));
    assert!(types.contains("  status: OrderStatus;\n"));
    assert!(types.contains("  items?: OrderItem[];\n"));
}

#[test]
fn cross_file_references_are_imported_once() {
    let dir = tempfile::TempDir::new().unwrap();
    compiler(dir.path(), false)
        .compile_text(ORDER_API, "openapi.json")
        .unwrap();

    let types = read(dir.path(), "example/order/types.ts");
    assert_eq!(types.matches("import { Money } from '../common/types';").count(), 1);
    assert!(!types.contains("from './types'"));

    let common = read(dir.path(), "example/common/types.ts");
    assert!(!common.contains("import"));
}

#[test]
fn clients_reference_runtime_and_models() {
    let dir = tempfile::TempDir::new().unwrap();
    compiler(dir.path(), false)
        .compile_text(ORDER_API, "openapi.json")
        .unwrap();

    let commands = read(dir.path(), "example/order/commandClient.ts");
    assert!(commands.contains("import { CreateOrder } from './types';"));
    assert!(commands.contains("@post('/tenant/{tenantId}/order')"));
    assert!(commands.contains(
        "createOrder(@request() request: ParameterRequest<CreateOrder>, @attribute() attributes?: Record<string, any>): Promise<CommandResult> {"
    ));
    assert!(commands.contains("throw autoGeneratedError(request, attributes);"));

    let queries = read(dir.path(), "example/order/queryClient.ts");
    assert!(queries.contains("resourceAttribution: ResourceAttributionPathSpec.TENANT,"));
    assert!(queries.contains("export type OrderDomainEventType = OrderCreated;"));

    let health = read(dir.path(), "example/HealthApiClient.ts");
    assert!(health.contains("export class HealthApiClient implements ApiMetadataCapable {"));
    assert!(health.contains("check(@attribute() attributes?: Record<string, any>): Promise<string> {"));
    assert!(!health.contains("HealthStreamApiClient"));
}

#[test]
fn dry_run_writes_nothing() {
    let dir = tempfile::TempDir::new().unwrap();
    let out = dir.path().join("generated");

    let result = compiler(&out, true)
        .compile_text(ORDER_API, "openapi.json")
        .unwrap();

    assert_eq!(result.files.len(), 5);
    assert!(!out.exists());
}

#[test]
fn yaml_file_input() {
    let dir = tempfile::TempDir::new().unwrap();
    let input = dir.path().join("openapi.yaml");
    std::fs::write(
        &input,
        r#"openapi: 3.0.1
info:
  title: Cart
  version: "1"
paths:
  /cart/{id}:
    get:
      operationId: shop.cart.get
      tags: [shop.cart]
components:
  schemas:
    shop.cart.CartState:
      type: object
      properties:
        id:
          type: string
"#,
    )
    .unwrap();

    let out = dir.path().join("out");
    let result = Compiler::new(CompilerConfig {
        input: InputSource::parse(input.to_str().unwrap()).unwrap(),
        out_dir: out.clone(),
        ..Default::default()
    })
    .compile()
    .unwrap();

    assert_eq!(result.aggregates, 1);
    let query = read(&out, "shop/cart/queryClient.ts");
    assert!(query.contains("export type CartStateType = CartState;"));
    assert!(query.contains("contextAlias: 'shop',"));
}

#[test]
fn unresolved_reference_skips_only_that_schema() {
    let dir = tempfile::TempDir::new().unwrap();
    let text = r##"{
      "components": {
        "schemas": {
          "example.Broken": { "type": "object", "properties": { "x": { "$ref": "#/components/schemas/example.Missing" } } },
          "example.Fine": { "type": "object", "properties": { "y": { "type": "integer" } } }
        }
      }
    }"##;

    let result = compiler(dir.path(), false)
        .compile_text(text, "broken.json")
        .unwrap();

    assert_eq!(result.models, 1);
    assert_eq!(result.skipped.len(), 1);
    assert_eq!(result.skipped[0].item, "example.Broken");
    assert!(result.skipped[0].reason.contains("example.Missing"));

    let types = read(dir.path(), "example/types.ts");
    assert!(types.contains("export interface Fine {"));
    assert!(!types.contains("Broken"));
}

#[test]
fn naming_collision_is_fatal() {
    let dir = tempfile::TempDir::new().unwrap();
    let text = r#"{
      "components": {
        "schemas": {
          "example.OrderItem": { "type": "object" },
          "example.Order.Item": { "type": "object" }
        }
      }
    }"#;

    let err = compiler(dir.path(), false)
        .compile_text(text, "collide.json")
        .unwrap_err();
    assert!(matches!(err, CompilerError::NamingCollision { .. }));
    assert!(std::fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn generator_config_keeps_tenant_parameter() {
    let dir = tempfile::TempDir::new().unwrap();
    let config_path = dir.path().join("fetchgen.yaml");
    std::fs::write(
        &config_path,
        "apiClients:\n  example.order:\n    ignorePathParameters: []\n",
    )
    .unwrap();

    let out = dir.path().join("out");
    Compiler::new(CompilerConfig {
        out_dir: out.clone(),
        config_path,
        ..Default::default()
    })
    .compile_text(ORDER_API, "openapi.json")
    .unwrap();

    let commands = read(&out, "example/order/commandClient.ts");
    assert!(commands.contains("createOrder(@path('tenantId') tenantId: string, @request()"));
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let err = Compiler::new(CompilerConfig {
        out_dir: dir.path().to_path_buf(),
        config_path: dir.path().join("absent.json"),
        ..Default::default()
    })
    .compile_text(ORDER_API, "openapi.json")
    .unwrap_err();
    assert!(matches!(err, CompilerError::InvalidConfig { .. }));
}

#[test]
fn unfetched_url_input_is_rejected() {
    let compiler = Compiler::new(CompilerConfig {
        input: InputSource::parse("https://example.com/v3/api-docs").unwrap(),
        ..Default::default()
    });
    let err = compiler.compile().unwrap_err();
    assert!(matches!(err, CompilerError::FetchFailed { .. }));
}

#[test]
fn unreadable_input_is_an_io_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let compiler = Compiler::new(CompilerConfig {
        input: InputSource::Path(dir.path().join("nope.json")),
        out_dir: dir.path().join("out"),
        ..Default::default()
    });
    let err = compiler.compile().unwrap_err();
    assert!(matches!(err, CompilerError::IoError { .. }));
}
