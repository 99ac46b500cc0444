use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use vkphotos::storage::repository;
use vkphotos::time_util::{format_time, parse_time};
use vkphotos::url::{resolve_album_id, resolve_owner, resolve_photo_id};
use vkphotos::{
    AlbumsQuery, ClientConfig, CommentsQuery, Database, Owner, PhotoSync, PhotosQuery, RemoteId,
    SortOrder, SyncOptions, SyncReport, VkClient, ACCESS_TOKEN_KEY,
};

#[derive(Parser)]
#[command(name = "vkphotos", about = "Sync VK photo albums to a local SQLite store")]
struct Cli {
    /// Database path (default: ~/.vkphotos/vkphotos.db)
    #[arg(long)]
    db: Option<String>,

    /// API access token (falls back to the `access_token` config key)
    #[arg(long, env = "VK_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// API base URL
    #[arg(long, env = "VK_API_URL", hide = true)]
    api_url: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Records per API page, at most 100
    #[arg(long)]
    page_size: Option<u32>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch remote collections into the local store
    Sync {
        #[command(subcommand)]
        target: SyncTarget,
    },
    /// Delete or restore a comment remotely, keeping the local row
    Comment {
        #[command(subcommand)]
        action: CommentAction,
    },
    /// List locally stored records
    List {
        #[command(subcommand)]
        target: ListTarget,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Show store status
    Status,
}

#[derive(Subcommand)]
enum SyncTarget {
    /// All albums of a user or group
    Albums {
        /// Signed owner id, club<N>/id<N>, or VK URL
        #[arg(value_name = "OWNER", value_parser = resolve_owner)]
        owner: Owner,
        /// Only these album ids
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u64>,
        #[arg(long)]
        need_covers: bool,
        /// Keep albums updated after this time
        #[arg(long, value_parser = parse_time)]
        after: Option<DateTime<Utc>>,
        /// Keep albums updated before this time (requires --after)
        #[arg(long, value_parser = parse_time)]
        before: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    /// Photos of one album (the album must be synced first)
    Photos {
        /// Album id (-1_2), album slug, or VK URL
        #[arg(value_name = "ALBUM", value_parser = resolve_album_id)]
        album: RemoteId,
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u64>,
        #[arg(long)]
        extended: bool,
        #[arg(long)]
        photo_sizes: bool,
        #[arg(long, value_parser = parse_time)]
        after: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_time)]
        before: Option<DateTime<Utc>>,
        /// Walk every page
        #[arg(long)]
        all: bool,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        count: Option<u32>,
        /// Page through the album oldest first
        #[arg(long)]
        rev: bool,
        #[arg(long)]
        json: bool,
    },
    /// Comments on one photo (the photo must be synced first)
    Comments {
        /// Photo id (-1_2), photo slug, or VK URL
        #[arg(value_name = "PHOTO", value_parser = resolve_photo_id)]
        photo: RemoteId,
        /// asc or desc
        #[arg(long, value_parser = parse_sort)]
        sort: Option<SortOrder>,
        #[arg(long, value_parser = parse_time)]
        after: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_time)]
        before: Option<DateTime<Utc>>,
        #[arg(long)]
        all: bool,
        #[arg(long)]
        offset: Option<u32>,
        #[arg(long)]
        count: Option<u32>,
        #[arg(long)]
        need_likes: bool,
        #[arg(long)]
        json: bool,
    },
    /// Users who liked one photo
    Likes {
        #[arg(value_name = "PHOTO", value_parser = resolve_photo_id)]
        photo: RemoteId,
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum CommentAction {
    /// Delete remotely and mark archived locally
    Archive {
        #[arg(value_name = "COMMENT_ID", value_parser = parse_remote_id)]
        id: RemoteId,
    },
    /// Restore remotely and clear the archived flag
    Restore {
        #[arg(value_name = "COMMENT_ID", value_parser = parse_remote_id)]
        id: RemoteId,
    },
}

#[derive(Subcommand)]
enum ListTarget {
    Albums {
        #[arg(value_name = "OWNER", value_parser = resolve_owner)]
        owner: Owner,
        #[arg(long, value_parser = parse_time)]
        after: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_time)]
        before: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    Photos {
        #[arg(value_name = "ALBUM", value_parser = resolve_album_id)]
        album: RemoteId,
        #[arg(long, value_parser = parse_time)]
        after: Option<DateTime<Utc>>,
        #[arg(long, value_parser = parse_time)]
        before: Option<DateTime<Utc>>,
        #[arg(long)]
        json: bool,
    },
    Comments {
        #[arg(value_name = "PHOTO", value_parser = resolve_photo_id)]
        photo: RemoteId,
        /// Include archived comments
        #[arg(long)]
        archived: bool,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

fn parse_sort(s: &str) -> Result<SortOrder, vkphotos::Error> {
    s.parse()
}

fn parse_remote_id(s: &str) -> Result<RemoteId, vkphotos::Error> {
    s.parse()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => Database::open_at(path).await?,
        None => Database::open().await?,
    };

    match cli.command {
        Commands::Status => {
            print_status(&db).await?;
        }
        Commands::Config { action } => {
            handle_config(&db, action).await?;
        }
        Commands::List { target } => {
            handle_list(&db, target).await?;
        }
        Commands::Sync { target } => {
            let app = connect(db, &cli.token, cli.api_url.as_deref(), cli.page_size).await?;
            handle_sync(&app, target).await?;
        }
        Commands::Comment { action } => {
            let app = connect(db, &cli.token, cli.api_url.as_deref(), cli.page_size).await?;
            match action {
                CommentAction::Archive { id } => {
                    let comment = app.archive_comment(id).await?;
                    println!("Archived comment {}", comment.remote_id);
                }
                CommentAction::Restore { id } => {
                    let comment = app.restore_comment(id).await?;
                    println!("Restored comment {}", comment.remote_id);
                }
            }
        }
    }

    Ok(())
}

fn build_client(token: String, api_url: Option<&str>) -> anyhow::Result<VkClient> {
    let mut config = ClientConfig::new(token);
    if let Some(url) = api_url {
        config = config.with_base_url(url);
    }
    Ok(VkClient::new(config)?)
}

async fn connect(
    db: Database,
    token: &Option<String>,
    api_url: Option<&str>,
    page_size: Option<u32>,
) -> anyhow::Result<PhotoSync> {
    let token = match token {
        Some(t) => t.clone(),
        None => vkphotos::config_get(&db, ACCESS_TOKEN_KEY).await?.ok_or_else(|| {
            anyhow::anyhow!(
                "No access token. Set VK_ACCESS_TOKEN or run: vkphotos config set {ACCESS_TOKEN_KEY} <TOKEN>"
            )
        })?,
    };

    let mut options = SyncOptions::default();
    if let Some(ps) = page_size {
        options.page_size = ps;
    }
    Ok(PhotoSync::new(db, build_client(token, api_url)?).with_options(options))
}

fn print_report(report: &SyncReport) {
    eprintln!(
        "  Done: {} fetched, {} created, {} updated ({})",
        report.fetched, report.created, report.updated, report.entity_key
    );
}

fn print_json<T: serde::Serialize>(items: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(items)?);
    Ok(())
}

fn print_albums(albums: &[vkphotos::Album]) {
    for album in albums {
        println!(
            "{}  {:<40}  {:>5} photos  updated {}",
            album.slug(),
            album.title,
            album.size,
            format_time(album.cut_time())
        );
    }
}

fn print_photos(photos: &[vkphotos::Photo]) {
    for photo in photos {
        println!(
            "{}  {}  likes {} comments {}  {}",
            photo.slug(),
            format_time(Some(photo.date)),
            photo.likes_count,
            photo.comments_count,
            photo.src()
        );
    }
}

fn print_comments(comments: &[vkphotos::Comment]) {
    for comment in comments {
        let marker = if comment.archived { " [archived]" } else { "" };
        println!(
            "{}  {}  {}{}: {}",
            comment.remote_id,
            format_time(Some(comment.date)),
            comment.author,
            marker,
            comment.text
        );
    }
}

async fn handle_sync(app: &PhotoSync, target: SyncTarget) -> anyhow::Result<()> {
    match target {
        SyncTarget::Albums {
            owner,
            ids,
            need_covers,
            after,
            before,
            json,
        } => {
            eprintln!("Syncing albums of {owner}...");
            let query = AlbumsQuery {
                ids,
                need_covers,
                after,
                before,
            };
            let synced = app.fetch_albums(owner, &query).await?;
            print_report(&synced.report);
            if json {
                print_json(&synced.items)?;
            } else {
                print_albums(&synced.items);
            }
        }
        SyncTarget::Photos {
            album,
            ids,
            extended,
            photo_sizes,
            after,
            before,
            all,
            offset,
            count,
            rev,
            json,
        } => {
            eprintln!("Syncing photos of album{album}...");
            let query = PhotosQuery {
                ids,
                extended,
                photo_sizes,
                after,
                before,
                all,
                offset,
                count,
                rev,
            };
            let synced = app.fetch_photos(album, &query).await?;
            print_report(&synced.report);
            if json {
                print_json(&synced.items)?;
            } else {
                print_photos(&synced.items);
            }
        }
        SyncTarget::Comments {
            photo,
            sort,
            after,
            before,
            all,
            offset,
            count,
            need_likes,
            json,
        } => {
            eprintln!("Syncing comments of photo{photo}...");
            let query = CommentsQuery {
                sort,
                count,
                offset,
                after,
                before,
                all,
                need_likes,
            };
            let synced = app.fetch_comments(photo, &query).await?;
            print_report(&synced.report);
            if json {
                print_json(&synced.items)?;
            } else {
                print_comments(&synced.items);
            }
        }
        SyncTarget::Likes { photo, all } => {
            eprintln!("Syncing likes of photo{photo}...");
            let synced = app.fetch_photo_likes(photo, all).await?;
            print_report(&synced.report);
            for user_id in &synced.items {
                println!("{}", Owner::User(*user_id));
            }
        }
    }
    Ok(())
}

async fn handle_list(db: &Database, target: ListTarget) -> anyhow::Result<()> {
    match target {
        ListTarget::Albums {
            owner,
            after,
            before,
            json,
        } => {
            let albums = db
                .reader()
                .call(move |conn| repository::list_albums(conn, owner, after, before))
                .await
                .map_err(vkphotos::Error::from)?;
            if json {
                print_json(&albums)?;
            } else if albums.is_empty() {
                println!("No albums stored for {owner}.");
            } else {
                print_albums(&albums);
            }
        }
        ListTarget::Photos {
            album,
            after,
            before,
            json,
        } => {
            let photos = db
                .reader()
                .call(move |conn| repository::list_photos(conn, &album, after, before))
                .await
                .map_err(vkphotos::Error::from)?;
            if json {
                print_json(&photos)?;
            } else if photos.is_empty() {
                println!("No photos stored for album{album}.");
            } else {
                print_photos(&photos);
            }
        }
        ListTarget::Comments {
            photo,
            archived,
            json,
        } => {
            let comments = db
                .reader()
                .call(move |conn| repository::list_comments(conn, &photo, None, None, archived))
                .await
                .map_err(vkphotos::Error::from)?;
            if json {
                print_json(&comments)?;
            } else if comments.is_empty() {
                println!("No comments stored for photo{photo}.");
            } else {
                print_comments(&comments);
            }
        }
    }
    Ok(())
}

async fn handle_config(db: &Database, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => match vkphotos::config_get(db, &key).await? {
            Some(v) if key == ACCESS_TOKEN_KEY => println!("{key} = {}…", mask(&v)),
            Some(v) => println!("{key} = {v}"),
            None => println!("{key} is not set"),
        },
        ConfigAction::Set { key, value } => {
            vkphotos::config_set(db, &key, &value).await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items = vkphotos::config_list(db).await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    if k == ACCESS_TOKEN_KEY {
                        println!("{k} = {}…", mask(&v));
                    } else {
                        println!("{k} = {v}");
                    }
                }
            }
        }
    }
    Ok(())
}

fn mask(token: &str) -> String {
    token.chars().take(6).collect()
}

async fn print_status(db: &Database) -> anyhow::Result<()> {
    let counts = db
        .reader()
        .call(|conn| repository::store_counts(conn))
        .await
        .map_err(vkphotos::Error::from)?;
    let last_sync = db
        .reader()
        .call(|conn| repository::last_completed_sync(conn))
        .await
        .map_err(vkphotos::Error::from)?;
    println!("Albums:    {}", counts.albums);
    println!("Photos:    {}", counts.photos);
    println!(
        "Comments:  {} ({} archived)",
        counts.comments, counts.archived_comments
    );
    println!("Users:     {}", counts.users);
    println!("Groups:    {}", counts.groups);
    println!(
        "Last sync: {}",
        last_sync.as_deref().unwrap_or("never")
    );
    Ok(())
}
