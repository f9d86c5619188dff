use crate::connection::ws_index;
use actix_web::web;

mod index;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws/{room_id}/").route(web::get().to(ws_index)));
    cfg.service(web::resource("/").route(web::get().to(index::index)));
}
