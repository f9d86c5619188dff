use actix_web::web;
use actix_web::Responder;
use askama_actix::Template;
use system::serde::Deserialize;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    room_id: String,
}

#[derive(Deserialize)]
pub struct IndexQuery {
    room: Option<String>,
}

pub async fn index(query: web::Query<IndexQuery>) -> impl Responder {
    IndexTemplate {
        room_id: query.room.clone().unwrap_or_else(|| "lobby".to_string()),
    }
}
