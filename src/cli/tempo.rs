use tabled::Table;

use crate::{
    cli::{connect, spinner},
    error,
    types::TempoTableRow,
};

pub async fn tempo(uris: Vec<String>) {
    let session = connect().await;

    let pb = spinner("Resolving tracks...");
    let mut tracks = match session.resolve_items_from_uris(&uris).await {
        Ok(tracks) => tracks,
        Err(e) => {
            pb.finish_and_clear();
            error!("Cannot resolve tracks. Err: {}", e)
        }
    };

    pb.set_message(format!("Looking up tempo of {} tracks...", tracks.len()));
    let annotated = session.annotate_tempos(&mut tracks).await;
    pb.finish_and_clear();
    if let Err(e) = annotated {
        error!("Cannot look up tempos. Err: {}", e);
    }

    let rows: Vec<TempoTableRow> = tracks
        .iter()
        .map(|t| TempoTableRow {
            name: t.name.clone(),
            artists: t.artists().join(", "),
            bpm: t.tempo().map_or_else(|| "-".to_string(), |bpm| bpm.to_string()),
        })
        .collect();
    println!("{}", Table::new(rows));
}
