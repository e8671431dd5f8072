use crate::{
    database::MongoDB,
    models::User,
    services::gemini_service::TextGenerator,
    utils::{error::AppError, validation},
};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Bson, Document};
use serde::{Deserialize, Serialize};

const SYSTEM_PROMPT: &str = "You are an intelligent blood donation assistant for HemoLink, a platform that connects blood donors with recipients in India. Your role is to:

1. Provide accurate information about blood donation, blood groups, and the donation process
2. Help users find donors by explaining how to use the platform's search features
3. Guide users through registration as donors
4. Answer frequently asked questions about eligibility, benefits, and safety of blood donation
5. Provide statistics about donors when requested
6. Always respond in a friendly, helpful, and professional manner

Important context about the platform:
- Users can register as donors and search for donors by blood group and location
- The platform has features for emergency requests (SOS), campaigns, and a donor leaderboard
- Users can view and update their profiles
- The platform is primarily used in India, so use Indian names, cities, and context when providing examples

When responding:
- Be concise but informative
- Use emojis appropriately to make responses engaging
- If asked about specific platform features, explain how to use them
- If asked about medical advice, recommend consulting a healthcare professional
- Always encourage blood donation as a noble cause that saves lives

For personalized responses, you may receive user information including their name, blood group, and location.";

const DONOR_STATS_UNAVAILABLE: &str =
    "I'm having trouble accessing donor statistics right now. Please try again later.";
const GROUP_STATS_UNAVAILABLE: &str =
    "I'm having trouble accessing blood group statistics right now. Please try again later.";

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Command,
    Ai,
    Fallback,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ChatReply {
    pub response: String,
    pub source: ReplySource,
}

impl ChatReply {
    fn new(response: impl Into<String>, source: ReplySource) -> Self {
        Self {
            response: response.into(),
            source,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialCommand {
    DonorCount,
    BloodGroupDistribution,
}

pub fn detect_command(message: &str) -> Option<SpecialCommand> {
    let lower = message.trim().to_lowercase();
    let any = |needles: &[&str]| needles.iter().any(|n| lower.contains(n));

    if any(&["donor statistics", "how many donors", "total donors"]) {
        Some(SpecialCommand::DonorCount)
    } else if any(&["blood group statistics", "most needed", "popular blood group"]) {
        Some(SpecialCommand::BloodGroupDistribution)
    } else {
        None
    }
}

pub fn format_donor_count(count: u64) -> String {
    format!(
        "We currently have {} registered donors in our system who are ready to help save lives! 🩸",
        count
    )
}

/// `stats` is (group, count), already sorted by count descending.
pub fn format_distribution(stats: &[(String, i64)]) -> String {
    let Some((top_group, top_count)) = stats.first() else {
        return "We're currently collecting blood group statistics. Check back later!".to_string();
    };

    let breakdown: Vec<String> = stats
        .iter()
        .map(|(group, count)| format!("{}: {} donors", group, count))
        .collect();

    format!(
        "Our most needed blood group is {} with {} donors. Here's the breakdown:\n{}",
        top_group,
        top_count,
        breakdown.join("\n")
    )
}

fn has_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric())
        .any(|token| token == word)
}

/// Rule-based answers used when the generator is unavailable.
pub fn fallback_reply(message: &str) -> &'static str {
    let lower = message.to_lowercase();
    let mentions_donation = lower.contains("donate") || lower.contains("donation");

    if lower.contains("hello") || has_word(&lower, "hi") || has_word(&lower, "hey") {
        "Hello! 👋 I'm your HemoLink assistant. How can I help you with blood donation today?"
    } else if lower.contains("help") || lower.contains("what can you do") {
        "I can help you with:\n\
         • Finding blood donors\n\
         • Learning about blood donation\n\
         • Registering as a donor\n\
         • Understanding blood groups\n\
         • Using our platform features\n\n\
         What would you like to know?"
    } else if lower.contains("blood group") || lower.contains("blood type") {
        "Here's blood group compatibility information:\n\n\
         O- (Universal Donor) can donate to everyone\n\
         AB+ (Universal Receiver) can receive from everyone\n\n\
         Other groups have specific compatibility rules. Would you like to know about a specific blood group?"
    } else if lower.contains("why") && mentions_donation {
        "Blood donation is a vital act of service that helps save lives in our community. Here's why it's so important:\n\n\
         🏥 Medical Necessity\n\
         • Emergency situations: Accident victims often need immediate blood transfusions\n\
         • Surgical procedures: Many operations require blood products\n\
         • Chronic illnesses: Patients with conditions like sickle cell anemia need regular transfusions\n\n\
         🤝 Community Impact\n\
         • Supply maintenance: Regular donations ensure hospitals have adequate blood supplies\n\
         • Universal help: Anyone can need blood regardless of age or background\n\n\
         💝 Personal Benefits\n\
         • Health screening: Donors receive free health checks\n\
         • Reduced disease risk: Studies suggest regular donation may lower heart disease risk\n\
         • Emotional satisfaction: Helping others provides a sense of purpose\n\n\
         🩸 Blood Facts\n\
         • One donation can save up to three lives\n\
         • You can donate blood every 56 days\n\
         • Only 3% of eligible people donate blood annually"
    } else if lower.contains("how") && mentions_donation {
        "The blood donation process:\n\
         1. Registration with ID\n\
         2. Health screening\n\
         3. Blood collection (8-12 minutes)\n\
         4. Refreshments and rest\n\n\
         The entire process takes about 30-45 minutes. You must be at least 17 years old and weigh at least 110 lbs."
    } else {
        "I'm here to help with blood donation information. Could you please be more specific about what you'd like to know?"
    }
}

pub fn user_context(user: &User) -> String {
    format!(
        "User context: {}, blood group: {}, location: {}, registered donor: {}. ",
        user.name,
        user.blood_group
            .map(|g| g.as_str())
            .unwrap_or("not specified"),
        user.city.as_deref().unwrap_or("not specified"),
        if user.is_donor { "yes" } else { "no" }
    )
}

pub fn build_prompt(message: &str, context: Option<&str>) -> String {
    format!(
        "{}\n\n{}User message: {}\n\nPlease provide a helpful response:",
        SYSTEM_PROMPT,
        context.unwrap_or_default(),
        message
    )
}

/// Asks the generator and falls back to the keyword table on any failure.
pub async fn converse(
    generator: &dyn TextGenerator,
    message: &str,
    context: Option<&str>,
) -> ChatReply {
    let prompt = build_prompt(message, context);

    match generator.generate(&prompt).await {
        Ok(text) => ChatReply::new(text, ReplySource::Ai),
        Err(e) => {
            log::warn!("⚠️  Chat generator unavailable, using fallback: {}", e);
            ChatReply::new(fallback_reply(message), ReplySource::Fallback)
        }
    }
}

pub async fn count_donors(db: &MongoDB) -> Result<u64, AppError> {
    Ok(db.users().count_documents(doc! { "isDonor": true }).await?)
}

pub async fn blood_group_distribution(db: &MongoDB) -> Result<Vec<(String, i64)>, AppError> {
    let pipeline = vec![
        doc! { "$match": { "isDonor": true } },
        doc! { "$group": { "_id": "$bloodGroup", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1 } },
    ];

    let rows: Vec<Document> = db.users().aggregate(pipeline).await?.try_collect().await?;

    Ok(rows
        .iter()
        .map(|row| {
            let group = match row.get("_id") {
                Some(Bson::String(g)) => g.clone(),
                _ => "Unknown".to_string(),
            };
            let count = match row.get("count") {
                Some(Bson::Int32(n)) => *n as i64,
                Some(Bson::Int64(n)) => *n,
                _ => 0,
            };
            (group, count)
        })
        .collect())
}

async fn run_command(db: &MongoDB, command: SpecialCommand) -> String {
    match command {
        SpecialCommand::DonorCount => match count_donors(db).await {
            Ok(count) => format_donor_count(count),
            Err(e) => {
                log::error!("❌ Error fetching donor statistics: {}", e);
                DONOR_STATS_UNAVAILABLE.to_string()
            }
        },
        SpecialCommand::BloodGroupDistribution => match blood_group_distribution(db).await {
            Ok(stats) => format_distribution(&stats),
            Err(e) => {
                log::error!("❌ Error fetching blood group statistics: {}", e);
                GROUP_STATS_UNAVAILABLE.to_string()
            }
        },
    }
}

/// Context is only added when `user_id` resolves to a user; lookup
/// failures are logged and ignored.
async fn load_context(db: &MongoDB, user_id: Option<&str>) -> Option<String> {
    let id = ObjectId::parse_str(user_id?).ok()?;

    match db.users().find_one(doc! { "_id": id }).await {
        Ok(user) => user.as_ref().map(user_context),
        Err(e) => {
            log::warn!("⚠️  Could not load chat user context: {}", e);
            None
        }
    }
}

pub async fn respond(
    db: &MongoDB,
    generator: &dyn TextGenerator,
    request: &ChatRequest,
) -> Result<ChatReply, AppError> {
    let message = validation::required(request.message.as_deref(), "Message")?;

    if let Some(command) = detect_command(&message) {
        return Ok(ChatReply::new(
            run_command(db, command).await,
            ReplySource::Command,
        ));
    }

    let context = load_context(db, request.user_id.as_deref()).await;
    Ok(converse(generator, &message, context.as_deref()).await)
}
