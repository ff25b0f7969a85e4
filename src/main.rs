use byline::build::{build_site, Site};
use byline::config::Config;
use byline::context::RenderContext;
use byline::tag::{AuthorTag, Tags};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use std::path::Path;
use tracing_subscriber::EnvFilter;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let dir_arg = Arg::with_name("dir")
        .long("dir")
        .short("d")
        .takes_value(true)
        .default_value(".")
        .help("The project directory (or any directory beneath it)");

    let matches = App::new("byline")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Resolves and normalizes the authors of static site posts")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("check")
                .about("Normalizes every post and prints its authors")
                .arg(dir_arg.clone()),
        )
        .subcommand(
            SubCommand::with_name("author")
                .about("Renders an author property for a post")
                .arg(
                    Arg::with_name("PROPERTY")
                        .required(true)
                        .index(1)
                        .help("The author property to render, e.g. `name`"),
                )
                .arg(
                    Arg::with_name("POST")
                        .required(true)
                        .index(2)
                        .help("The slug of the post"),
                )
                .arg(dir_arg),
        )
        .get_matches();

    if let Err(e) = run(&matches) {
        eprintln!("ERROR {}", e);
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches) -> Result<()> {
    match matches.subcommand() {
        ("check", Some(matches)) => check(&load(matches)?),
        ("author", Some(matches)) => {
            let site = load(matches)?;
            // both arguments are required
            let property = matches.value_of("PROPERTY").unwrap_or_default();
            let slug = matches.value_of("POST").unwrap_or_default();
            let post = site
                .post(slug)
                .ok_or_else(|| format!("Could not find post '{}'", slug))?;
            let context = RenderContext::for_page(&site, post);
            println!(
                "{}",
                Tags::default().render(AuthorTag::NAME, property, &context)?
            );
            Ok(())
        }
        _ => Ok(()),
    }
}

fn load(matches: &ArgMatches) -> Result<Site> {
    let dir = Path::new(matches.value_of("dir").unwrap_or("."));
    Ok(build_site(Config::from_directory(dir)?)?)
}

fn check(site: &Site) -> Result<()> {
    for post in &site.posts {
        let authors: Vec<&str> = post
            .authors()
            .iter()
            .map(|author| author.get("name").unwrap_or(&author.id))
            .collect();
        println!("{}: {}", post.path.display(), authors.join(", "));
    }
    Ok(())
}
