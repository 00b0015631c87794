use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use fake::Fake;
use fake::faker::lorem::en::{Sentence, Word};
use rand::Rng;
use relpage::{
    config::{AppState, ArticleData, PAGINATE, PAGINATE_ACTIVE},
    models::article_model::{ArticleQuery, NewArticle, active_filter, article_add, articles_clear},
    query::Direction,
};
use std::error::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const TAGS: [&str; 5] = ["rust", "async", "postgres", "web", "cli"];

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fill the articles table with fake articles
    Seed {
        /// Number of articles
        #[arg(long, default_value_t = 25)]
        articles: u32,

        /// Delete existing articles first
        #[arg(long)]
        clear: bool,
    },
    /// Print one page of articles as JSON
    List {
        /// Pagination method to call
        #[arg(long, default_value = PAGINATE)]
        method: String,

        #[arg(long)]
        page_index: Option<i64>,

        #[arg(long)]
        page_size: Option<i64>,

        /// Field to order by, ties broken by id
        #[arg(long)]
        order_by: Option<String>,

        /// Order descending
        #[arg(long)]
        desc: bool,

        #[arg(long)]
        title_prefix: Option<String>,

        #[arg(long)]
        tag: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // load env vars
    dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_file(true).with_line_number(true).pretty())
        .init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Command::Seed { articles, clear } => seed(articles, clear).await,
        Command::List {
            method,
            page_index,
            page_size,
            order_by,
            desc,
            title_prefix,
            tag,
        } => {
            let query = ArticleQuery {
                page_index,
                page_size,
                order_by,
                order: desc.then_some(Direction::Desc),
                title_prefix,
                tag,
                ..Default::default()
            };
            list(&method, query).await
        }
    };

    if let Err(err) = outcome {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

async fn seed(articles: u32, clear: bool) -> Result<(), Box<dyn Error>> {
    let article_data = ArticleData::new().await?;
    let db_pool = &article_data.articles_db;

    if clear {
        articles_clear(db_pool).await?;
    }

    let mut rng = rand::rng();
    for _ in 0..articles {
        let title: String = Sentence(2..6).fake();
        let tag_count = rng.random_range(0..=2);
        let tags = (0..tag_count)
            .map(|_| TAGS[rng.random_range(0..TAGS.len())].to_string())
            .collect();
        let attachment = rng
            .random_bool(1.0 / 3.0)
            .then(|| format!("{}.pdf", Word().fake::<String>()));

        let article = NewArticle {
            title: title.trim_end_matches('.').to_string(),
            counter: rng.random_range(0..100),
            inactive: rng.random_bool(1.0 / 5.0),
            attachment,
            tags,
        };
        article_add(db_pool, article).await?;
    }

    println!("Successfully generated {articles} articles");
    Ok(())
}

async fn list(method: &str, query: ArticleQuery) -> Result<(), Box<dyn Error>> {
    let app_state = AppState::new().await?;
    let base_filter = (method == PAGINATE_ACTIVE).then(active_filter);
    let page = app_state.articles.paginate(method, query.into_request(base_filter)).await?;

    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}
