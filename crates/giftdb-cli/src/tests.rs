use super::*;

#[test]
fn parses_search_with_filters() {
    let cli = Cli::try_parse_from([
        "giftdb-cli",
        "search",
        "lego friends",
        "--gender",
        "girls",
        "--max-price",
        "49.99",
        "--with-retailers",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Search {
            query,
            filters,
            with_retailers,
            parallel,
        } => {
            assert_eq!(query, "lego friends");
            assert_eq!(filters.gender.as_deref(), Some("girls"));
            assert_eq!(filters.category, None);
            assert_eq!(filters.max_price, Some(Decimal::new(4999, 2)));
            assert!(with_retailers);
            assert!(!parallel);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn search_requires_a_query() {
    assert!(Cli::try_parse_from(["giftdb-cli", "search"]).is_err());
}

#[test]
fn rejects_non_numeric_max_price() {
    assert!(
        Cli::try_parse_from(["giftdb-cli", "search", "doll", "--max-price", "cheap"]).is_err()
    );
}

#[test]
fn parses_verify_image_command() {
    let cli = Cli::try_parse_from(["giftdb-cli", "verify-image", "https://img.test/a.jpg"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::VerifyImage { ref url } if url == "https://img.test/a.jpg"
    ));
}

#[test]
fn parses_scrape_and_retailers_commands() {
    let cli = Cli::try_parse_from(["giftdb-cli", "scrape", "https://www.target.com/p/x/-/A-1"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Scrape { .. }));

    let cli = Cli::try_parse_from(["giftdb-cli", "retailers", "uno"])
        .expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Retailers { ref query } if query == "uno"));
}

#[test]
fn rows_query_defaults_to_everything() {
    let cli = Cli::try_parse_from(["giftdb-cli", "rows", "--seeds", "seeds.yaml"])
        .expect("expected valid cli args");
    match cli.command {
        Commands::Rows {
            query,
            seeds,
            filters,
        } => {
            assert_eq!(query, "");
            assert_eq!(seeds, Some(PathBuf::from("seeds.yaml")));
            assert_eq!(filters, FilterArgs::default());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn filter_args_convert_to_query_filters() {
    let filters: QueryFilters = FilterArgs {
        gender: None,
        category: Some("building-sets".to_string()),
        max_price: None,
    }
    .into();
    assert_eq!(filters.category.as_deref(), Some("building-sets"));
    assert!(filters.gender.is_none());
}
