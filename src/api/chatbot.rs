use actix_web::{web, HttpResponse, ResponseError};
use crate::database::MongoDB;
use crate::services::chatbot_service::{self, ChatReply, ChatRequest};
use crate::services::gemini_service::TextGenerator;

#[utoipa::path(
    post,
    path = "/api/chatbot/message",
    tag = "Chatbot",
    request_body = ChatRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 400, description = "Message is required")
    )
)]
pub async fn send_message(
    db: web::Data<MongoDB>,
    generator: web::Data<dyn TextGenerator>,
    request: web::Json<ChatRequest>,
) -> HttpResponse {
    log::info!("💬 POST /api/chatbot/message");

    match chatbot_service::respond(&db, generator.get_ref(), &request).await {
        Ok(reply) => HttpResponse::Ok().json(reply),
        Err(e) => e.error_response(),
    }
}
