use acetour::{
    config::Settings,
    domain::{CreateUserRequest, FaqInput, MiceCardInput, ReviewInput, UserRole},
    repository::{
        FaqRepository, MiceCardRepository, ReviewRepository, UserRepository,
        SqliteFaqRepository, SqliteMiceCardRepository, SqliteReviewRepository, SqliteUserRepository,
    },
};
use clap::Parser;
use sqlx::sqlite::SqlitePoolOptions;

/// Create (or reset) the admin account and optionally load sample content.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    #[arg(long, default_value = "admin@acetour.com")]
    email: String,

    #[arg(long, env = "ACETOUR_ADMIN_PASSWORD")]
    password: String,

    #[arg(long, default_value = "Admin")]
    name: String,

    /// Database URL; defaults to the configured one.
    #[arg(long)]
    database_url: Option<String>,

    /// Insert example FAQs, MICE cards and reviews into empty tables.
    #[arg(long)]
    sample_content: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    if args.password.len() < 6 {
        anyhow::bail!("Password must be at least 6 characters");
    }

    let database_url = match args.database_url {
        Some(url) => url,
        None => Settings::new().unwrap_or_default().database.url,
    };

    println!("Seeding {}", database_url);

    let db_pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(&database_url)
        .await?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await?;

    let user_repo = SqliteUserRepository::new(db_pool.clone());
    match user_repo.find_by_email(&args.email).await? {
        Some(existing) => {
            user_repo.set_password(existing.id, &args.password).await?;
            if existing.role != UserRole::Admin {
                println!("  ! {} exists but is not an admin; only the password was reset", existing.email);
            } else {
                println!("  Reset password for admin {}", existing.email);
            }
        }
        None => {
            let admin = user_repo.create(CreateUserRequest {
                email: args.email.clone(),
                name: Some(args.name.clone()),
                password: args.password.clone(),
                role: UserRole::Admin,
            }).await?;
            println!("  Created admin {}", admin.email);
        }
    }

    if args.sample_content {
        seed_sample_content(db_pool.clone()).await?;
    }

    println!("Done.");
    Ok(())
}

async fn seed_sample_content(db_pool: sqlx::SqlitePool) -> anyhow::Result<()> {
    let faq_repo = SqliteFaqRepository::new(db_pool.clone());
    if faq_repo.list().await?.is_empty() {
        let faqs = [
            ("en", 0, "Where does the shuttle pick up?", "In the Convoy H Mart parking lot in San Diego and at the LAX arrivals level."),
            ("en", 1, "How much luggage can I bring?", "Each passenger may bring two checked bags and one carry-on."),
            ("ko", 0, "셔틀은 어디에서 탑승하나요?", "샌디에고 콘보이 H마트 주차장과 LAX 도착층에서 탑승합니다."),
        ];
        for (locale, order, title, content) in faqs {
            faq_repo.create(FaqInput {
                title: title.to_string(),
                content: content.to_string(),
                category: Some("Shuttle".to_string()),
                locale: locale.to_string(),
                order,
                is_active: true,
            }).await?;
        }
        println!("  Added {} FAQs", faqs.len());
    }

    let card_repo = SqliteMiceCardRepository::new(db_pool.clone());
    if card_repo.list().await?.is_empty() {
        card_repo.create(MiceCardInput {
            label: "Conference".to_string(),
            date: "2025-03-05".to_string(),
            content: "Corporate delegation tour and venue coordination in Seoul.".to_string(),
            image_url: "https://res.cloudinary.com/demo/image/upload/sample.jpg".to_string(),
            image_alt: "Conference hall".to_string(),
            order: 0,
            is_active: true,
        }).await?;
        println!("  Added 1 MICE card");
    }

    let review_repo = SqliteReviewRepository::new(db_pool);
    if review_repo.list().await?.is_empty() {
        review_repo.create(ReviewInput {
            reviewer_initial: "J".to_string(),
            reviewer_name: "Jiyoon".to_string(),
            review_text: "On time both ways and the driver helped with all our bags.".to_string(),
            read_more_link: None,
            order: 0,
            is_active: true,
        }).await?;
        println!("  Added 1 review");
    }

    Ok(())
}
