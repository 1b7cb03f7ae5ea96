use std::collections::HashMap;

use actix_cors::Cors;
use actix_web::{get, post, put, web, App, HttpResponse, HttpServer};
use mongodb::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use campussplit::error::LedgerError;
use campussplit::ledger::{LedgerEngine, NewEqualSplitExpense, NewExpense};
use campussplit::money::Money;
use campussplit::schemas::{Category, Group, Member, MemberId};
use campussplit::store::{LedgerStore, MongoStore};

type Engine = LedgerEngine<MongoStore>;

#[derive(Deserialize)]
struct GroupJson {
    name: String,
    members: Vec<Member>,
}

#[put("/groups/{id}")]
async fn add_group(
    engine: web::Data<Engine>,
    id: web::Path<String>,
    json: web::Json<GroupJson>,
) -> Result<HttpResponse, LedgerError> {
    let json = json.into_inner();
    let group = Group {
        id: id.into_inner(),
        name: json.name,
        members: json.members,
    };
    engine.store().insert_group(&group).await?;
    Ok(HttpResponse::Ok().body("Group added"))
}

#[derive(Deserialize)]
struct ExpenseJson {
    description: String,
    amount: Money,
    paid_by: MemberId,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    receipt_ref: Option<String>,
    shares: HashMap<MemberId, Money>,
}

#[post("/groups/{id}/expenses")]
async fn add_expense(
    engine: web::Data<Engine>,
    id: web::Path<String>,
    json: web::Json<ExpenseJson>,
) -> Result<HttpResponse, LedgerError> {
    let json = json.into_inner();
    let expense = engine
        .record_expense(
            &id.into_inner(),
            NewExpense {
                description: json.description,
                amount: json.amount,
                paid_by: json.paid_by,
                category: json.category,
                notes: json.notes,
                receipt_ref: json.receipt_ref,
                shares: json.shares,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "id": expense.id })))
}

#[derive(Deserialize)]
struct EqualSplitJson {
    description: String,
    amount: Money,
    paid_by: MemberId,
    #[serde(default)]
    category: Category,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    receipt_ref: Option<String>,
    participants: Vec<MemberId>,
}

#[post("/groups/{id}/expenses/equal-split")]
async fn add_equal_split_expense(
    engine: web::Data<Engine>,
    id: web::Path<String>,
    json: web::Json<EqualSplitJson>,
) -> Result<HttpResponse, LedgerError> {
    let json = json.into_inner();
    let expense = engine
        .record_equal_split_expense(
            &id.into_inner(),
            NewEqualSplitExpense {
                description: json.description,
                amount: json.amount,
                paid_by: json.paid_by,
                category: json.category,
                notes: json.notes,
                receipt_ref: json.receipt_ref,
                participants: json.participants,
            },
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "id": expense.id })))
}

#[derive(Deserialize)]
struct SettlementJson {
    from_member_id: MemberId,
    to_member_id: MemberId,
    amount: Money,
}

#[post("/groups/{id}/settlements")]
async fn add_settlement(
    engine: web::Data<Engine>,
    id: web::Path<String>,
    json: web::Json<SettlementJson>,
) -> Result<HttpResponse, LedgerError> {
    let json = json.into_inner();
    let settlement = engine
        .record_settlement(
            &id.into_inner(),
            &json.from_member_id,
            &json.to_member_id,
            json.amount,
        )
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "id": settlement.id })))
}

#[get("/groups/{id}/balances")]
async fn get_balances(
    engine: web::Data<Engine>,
    id: web::Path<String>,
) -> Result<HttpResponse, LedgerError> {
    let balances = engine.balances(&id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(balances))
}

#[get("/groups/{id}/balances/pairwise")]
async fn get_pairwise_balances(
    engine: web::Data<Engine>,
    id: web::Path<String>,
) -> Result<HttpResponse, LedgerError> {
    let pairs = engine.pairwise_balances(&id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(pairs))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let uri = std::env::var("MONGODB_URI").expect("You need to add the MONGODB_URI to the env");
    let client = Client::with_uri_str(&uri).await.expect("failed to connect");
    info!("connected to storage");

    let bind = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_owned());
    info!(%bind, "starting ledger service");

    let engine = web::Data::new(LedgerEngine::new(MongoStore::new(client)));
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .app_data(engine.clone())
            .service(add_group)
            .service(add_expense)
            .service(add_equal_split_expense)
            .service(add_settlement)
            .service(get_balances)
            .service(get_pairwise_balances)
    })
    .bind(bind)?
    .run()
    .await
}
