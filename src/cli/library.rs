use tabled::Table;

use crate::{
    cli::{connect, spinner},
    error,
    library::{ItemDetails, ItemKind, LibraryItem},
    success,
    types::ItemTableRow,
};

pub async fn library(kind: ItemKind, search: Option<String>) {
    let session = connect().await;

    let pb = spinner(&format!("Fetching saved {kind}s..."));
    let items = session.saved_items(kind).await;
    pb.finish_and_clear();

    let mut items = match items {
        Ok(items) => items,
        Err(e) => error!("Cannot load saved {}s. Err: {}", kind, e),
    };

    if let Some(search) = search {
        let term = search.to_lowercase();
        items.retain(|i| i.name.to_lowercase().contains(&term));
    }

    let count = items.len();
    let rows: Vec<ItemTableRow> = items.into_iter().map(row).collect();
    println!("{}", Table::new(rows));
    success!("{} {}s", count, kind);
}

fn row(item: LibraryItem) -> ItemTableRow {
    let by = match &item.details {
        ItemDetails::Playlist { owner } => owner.clone().unwrap_or_else(|| "-".into()),
        _ => item.artists().join(", "),
    };
    ItemTableRow {
        uri: item.uri(),
        name: item.name,
        by,
    }
}
