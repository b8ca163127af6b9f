//! Tests for SqliteSongRepository.

use crate::db::pagination::{PageRequest, RowPage, paginate_rows};
use crate::db::{
    Database, DbError, Field, NewEntry, PartialEntry, ReleaseDate, SongDetails, SongRepository,
    SqliteDatabase,
};

async fn setup_db() -> SqliteDatabase {
    let db = SqliteDatabase::in_memory()
        .await
        .expect("Failed to create in-memory database");
    db.migrate().await.expect("Migration should succeed");
    db
}

fn make_entry(group: &str, song: &str) -> NewEntry {
    NewEntry {
        group_name: group.to_string(),
        song_name: song.to_string(),
        details: SongDetails {
            release_date: ReleaseDate::from_ymd(2006, 7, 16).unwrap(),
            text: "Ooh baby, don't you know I suffer?\n\nOoh baby, can you hear me moan?"
                .to_string(),
            link: "https://www.youtube.com/watch?v=Xsp3_a-PMTw".to_string(),
        },
    }
}

async fn row_count(db: &SqliteDatabase, table: &str) -> i64 {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
        .fetch_one(db.pool())
        .await
        .unwrap()
}

// =============================================================================
// Create
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn create_and_get() {
    let db = setup_db().await;
    let songs = db.songs();

    let entry = make_entry("Muse", "Supermassive Black Hole");
    let id = songs.create(&entry).await.expect("Create should succeed");

    let stored = songs.get(id).await.expect("Get should succeed");
    assert_eq!(stored.id, id);
    assert_eq!(stored.group_name, "Muse");
    assert_eq!(stored.song_name, "Supermassive Black Hole");
    assert_eq!(stored.release_date, entry.details.release_date);
    assert_eq!(stored.text, entry.details.text);
    assert_eq!(stored.link, entry.details.link);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_twice_reports_group_exists_first() {
    let db = setup_db().await;
    let songs = db.songs();

    songs.create(&make_entry("A", "X")).await.unwrap();
    let err = songs.create(&make_entry("A", "X")).await.unwrap_err();

    assert!(
        matches!(err, DbError::GroupExists { ref name, op: "songs.create" } if name == "A"),
        "unexpected error: {:?}",
        err
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn create_with_taken_song_name_reports_song_exists_and_rolls_back() {
    let db = setup_db().await;
    let songs = db.songs();

    songs.create(&make_entry("Muse", "Uprising")).await.unwrap();
    let err = songs
        .create(&make_entry("Other Group", "Uprising"))
        .await
        .unwrap_err();

    assert!(matches!(err, DbError::SongExists { .. }), "got {:?}", err);
    // The group insert of the failed attempt must not survive.
    assert_eq!(row_count(&db, "groups").await, 1);
    assert_eq!(row_count(&db, "songs").await, 1);
    assert_eq!(row_count(&db, "song_details").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn create_requires_group_and_song() {
    let db = setup_db().await;
    let err = db.songs().create(&make_entry("", "X")).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
    assert_eq!(row_count(&db, "groups").await, 0);
}

// =============================================================================
// Count / List
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn count_and_list_with_empty_filter() {
    let db = setup_db().await;
    let songs = db.songs();

    assert_eq!(songs.count(&PartialEntry::default()).await.unwrap(), 0);

    songs.create(&make_entry("Muse", "Uprising")).await.unwrap();
    songs.create(&make_entry("Coldplay", "Yellow")).await.unwrap();

    let filter = PartialEntry::default();
    assert_eq!(songs.count(&filter).await.unwrap(), 2);

    let listed = songs.list(&filter, 1, 10).await.unwrap();
    let names: Vec<&str> = listed.iter().map(|e| e.song_name.as_str()).collect();
    assert_eq!(names, vec!["Uprising", "Yellow"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn filter_matches_every_supplied_field() {
    let db = setup_db().await;
    let songs = db.songs();

    songs.create(&make_entry("Muse", "Uprising")).await.unwrap();
    let mut other = make_entry("Coldplay", "Yellow");
    other.details.release_date = ReleaseDate::from_ymd(2000, 6, 26).unwrap();
    songs.create(&other).await.unwrap();

    let by_group = PartialEntry::default().with_group("Coldplay");
    assert_eq!(songs.count(&by_group).await.unwrap(), 1);
    let listed = songs.list(&by_group, 1, 10).await.unwrap();
    assert_eq!(listed[0].song_name, "Yellow");

    let by_date =
        PartialEntry::default().with_release_date(ReleaseDate::from_ymd(2006, 7, 16).unwrap());
    let listed = songs.list(&by_date, 1, 10).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].group_name, "Muse");

    let mismatch = PartialEntry::default()
        .with_group("Muse")
        .with_song("Yellow");
    assert_eq!(songs.count(&mismatch).await.unwrap(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn cleared_filter_fields_do_not_restrict() {
    let db = setup_db().await;
    let songs = db.songs();
    songs.create(&make_entry("Muse", "Uprising")).await.unwrap();

    let filter = PartialEntry {
        group: Field::Cleared,
        text: Field::Value(String::new()),
        ..Default::default()
    };
    assert_eq!(songs.count(&filter).await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_pages_are_stable_and_sized_by_count() {
    let db = setup_db().await;
    let songs = db.songs();

    // Group names are unique, so each song gets its own group.
    for i in 0..25 {
        songs
            .create(&make_entry(&format!("Group {:02}", i), &format!("Song {:02}", i)))
            .await
            .unwrap();
    }

    let filter = PartialEntry::default();
    let total = songs.count(&filter).await.unwrap();
    assert_eq!(total, 25);

    let RowPage::Window(window) = paginate_rows(total, PageRequest::new(1, 10)) else {
        panic!("expected rows");
    };
    assert_eq!(window.total_pages, 3);
    assert_eq!(window.offset, 0);
    let first = songs
        .list(&filter, window.page, window.page_size)
        .await
        .unwrap();
    assert_eq!(first.len(), window.expected_len());
    assert_eq!(first.len(), 10);

    let RowPage::Window(last) = paginate_rows(total, PageRequest::new(7, 10)) else {
        panic!("expected rows");
    };
    let tail = songs.list(&filter, last.page, last.page_size).await.unwrap();
    assert_eq!(tail.len(), last.expected_len());
    assert_eq!(tail.len(), 5);
    assert_eq!(tail[0].song_name, "Song 20");

    let again = songs.list(&filter, 1, 10).await.unwrap();
    assert_eq!(first, again);
}

#[tokio::test(flavor = "multi_thread")]
async fn list_rejects_zero_page() {
    let db = setup_db().await;
    let err = db
        .songs()
        .list(&PartialEntry::default(), 0, 10)
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
}

// =============================================================================
// Get text
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn get_text_returns_lyrics() {
    let db = setup_db().await;
    let songs = db.songs();
    let entry = make_entry("Muse", "Supermassive Black Hole");
    songs.create(&entry).await.unwrap();

    let text = songs
        .get_text("Muse", "Supermassive Black Hole")
        .await
        .unwrap();
    assert_eq!(text, entry.details.text);
}

#[tokio::test(flavor = "multi_thread")]
async fn get_text_unknown_song_is_not_found() {
    let db = setup_db().await;
    let songs = db.songs();
    songs.create(&make_entry("Coldplay", "Yellow")).await.unwrap();

    let err = songs.get_text("Coldplay", "Unknown").await.unwrap_err();
    assert!(
        matches!(err, DbError::NotFound { op: "songs.get_text", .. }),
        "got {:?}",
        err
    );
}

// =============================================================================
// Patch
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn patch_updates_only_supplied_columns() {
    let db = setup_db().await;
    let songs = db.songs();
    let id = songs.create(&make_entry("Muse", "Uprising")).await.unwrap();

    let changes = PartialEntry::default()
        .with_link("https://example.com/new")
        .with_release_date(ReleaseDate::from_ymd(2009, 9, 7).unwrap());
    songs.patch(id, &changes).await.expect("Patch should succeed");

    let stored = songs.get(id).await.unwrap();
    assert_eq!(stored.link, "https://example.com/new");
    assert_eq!(stored.release_date.to_string(), "07.09.2009");
    assert_eq!(stored.group_name, "Muse");
    assert_eq!(stored.song_name, "Uprising");
    assert_eq!(stored.text, make_entry("Muse", "Uprising").details.text);
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_renames_group_and_song() {
    let db = setup_db().await;
    let songs = db.songs();
    let id = songs.create(&make_entry("Muse", "Uprising")).await.unwrap();

    let changes = PartialEntry::default()
        .with_group("MUSE")
        .with_song("Uprising (Live)");
    songs.patch(id, &changes).await.unwrap();

    let stored = songs.get(id).await.unwrap();
    assert_eq!(stored.group_name, "MUSE");
    assert_eq!(stored.song_name, "Uprising (Live)");
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_with_no_changes_is_invalid_input() {
    let db = setup_db().await;
    let songs = db.songs();
    let mut last = 0;
    for i in 0..7 {
        last = songs
            .create(&make_entry(&format!("G{}", i), &format!("S{}", i)))
            .await
            .unwrap();
    }
    assert_eq!(last, 7);

    let err = songs.patch(7, &PartialEntry::default()).await.unwrap_err();
    assert!(
        matches!(err, DbError::InvalidInput { ref message, .. } if message == "no changes"),
        "got {:?}",
        err
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_with_only_cleared_fields_is_invalid_input() {
    let db = setup_db().await;
    let songs = db.songs();
    let id = songs.create(&make_entry("Muse", "Uprising")).await.unwrap();

    let changes = PartialEntry::default().with_text("").with_link("");
    let err = songs.patch(id, &changes).await.unwrap_err();
    assert!(matches!(err, DbError::InvalidInput { .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_missing_song_is_not_found() {
    let db = setup_db().await;
    let err = db
        .songs()
        .patch(42, &PartialEntry::default().with_text("x"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::NotFound { op: "songs.patch", .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_rename_conflict_rolls_back_everything() {
    let db = setup_db().await;
    let songs = db.songs();
    let id = songs.create(&make_entry("Muse", "Uprising")).await.unwrap();
    songs.create(&make_entry("Coldplay", "Yellow")).await.unwrap();

    // Group rename succeeds inside the transaction, song rename collides.
    let changes = PartialEntry::default()
        .with_group("Muse Renamed")
        .with_song("Yellow");
    let err = songs.patch(id, &changes).await.unwrap_err();
    assert!(matches!(err, DbError::SongExists { .. }), "got {:?}", err);

    let stored = songs.get(id).await.unwrap();
    assert_eq!(stored.group_name, "Muse");
    assert_eq!(stored.song_name, "Uprising");

    let err = songs
        .patch(id, &PartialEntry::default().with_group("Coldplay"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::GroupExists { .. }), "got {:?}", err);
}

// =============================================================================
// Delete
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_song_and_details() {
    let db = setup_db().await;
    let songs = db.songs();
    let id = songs.create(&make_entry("Muse", "Uprising")).await.unwrap();

    songs.delete(id).await.expect("Delete should succeed");

    assert!(matches!(
        songs.get(id).await,
        Err(DbError::NotFound { .. })
    ));
    assert_eq!(row_count(&db, "songs").await, 0);
    assert_eq!(row_count(&db, "song_details").await, 0);
    // The owning group is kept.
    assert_eq!(row_count(&db, "groups").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_missing_song_is_not_found() {
    let db = setup_db().await;
    let err = db.songs().delete(99).await.unwrap_err();
    assert!(matches!(err, DbError::NotFound { op: "songs.delete", .. }));
}

#[tokio::test(flavor = "multi_thread")]
async fn cascade_removes_details_on_direct_song_delete() {
    let db = setup_db().await;
    let id = db.songs().create(&make_entry("Muse", "Uprising")).await.unwrap();

    sqlx::query("DELETE FROM songs WHERE id = ?1")
        .bind(id)
        .execute(db.pool())
        .await
        .unwrap();

    assert_eq!(row_count(&db, "song_details").await, 0);
}

// =============================================================================
// Concurrent writers
// =============================================================================

/// A pooled database backed by a file, so writers run on separate connections.
async fn setup_file_db(dir: &tempfile::TempDir) -> SqliteDatabase {
    let db = SqliteDatabase::open(dir.path().join("catalog.db"))
        .await
        .expect("Failed to open file database");
    db.migrate().await.expect("Migration should succeed");
    db
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_patches_on_one_song_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir).await;
    let id = db.songs().create(&make_entry("Muse", "Uprising")).await.unwrap();

    let tasks: Vec<_> = (0..40)
        .map(|i| {
            let db = db.clone();
            tokio::spawn(async move {
                let changes = PartialEntry::default().with_link(format!("l{}", i));
                db.songs().patch(id, &changes).await
            })
        })
        .collect();

    for task in tasks {
        let result = task.await.expect("task should not panic");
        assert!(result.is_ok(), "concurrent patch failed: {:?}", result);
    }

    let stored = db.songs().get(id).await.unwrap();
    let winners: Vec<String> = (0..40).map(|i| format!("l{}", i)).collect();
    assert!(winners.contains(&stored.link));
    assert_eq!(row_count(&db, "song_details").await, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_patches_and_creates_all_succeed() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_file_db(&dir).await;
    let id = db.songs().create(&make_entry("Muse", "Uprising")).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let patcher = db.clone();
        tasks.push(tokio::spawn(async move {
            let changes = PartialEntry::default().with_text(format!("verse {}", i));
            patcher.songs().patch(id, &changes).await.map(|_| ())
        }));

        let creator = db.clone();
        tasks.push(tokio::spawn(async move {
            let entry = make_entry(&format!("Group {}", i), &format!("Song {}", i));
            creator.songs().create(&entry).await.map(|_| ())
        }));
    }

    for task in tasks {
        let result = task.await.expect("task should not panic");
        assert!(result.is_ok(), "concurrent write failed: {:?}", result);
    }

    assert_eq!(row_count(&db, "songs").await, 21);
    assert_eq!(row_count(&db, "groups").await, 21);
    assert_eq!(row_count(&db, "song_details").await, 21);
}
