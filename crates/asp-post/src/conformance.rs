//! Behaviour every [`PostRepository`] must share, run against each backend.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};

use asp_store::{FileDocumentStore, InMemoryDocumentStore};
use asp_types::User;

use crate::comment::Comment;
use crate::document::DocumentPostRepository;
use crate::error::PostError;
use crate::memory::InMemoryPostRepository;
use crate::post::{Category, NewPost, Post, PostType};
use crate::traits::{Deleted, PostRepository};

pub(crate) struct Fixture {
    _dir: Option<tempfile::TempDir>,
    pub repo: Arc<dyn PostRepository>,
}

pub(crate) fn memory() -> Fixture {
    Fixture {
        _dir: None,
        repo: Arc::new(InMemoryPostRepository::new()),
    }
}

pub(crate) fn document_in_memory() -> Fixture {
    let store = Arc::new(InMemoryDocumentStore::new());
    Fixture {
        _dir: None,
        repo: Arc::new(DocumentPostRepository::new(store)),
    }
}

pub(crate) fn document_on_disk() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileDocumentStore::open(dir.path()).unwrap());
    Fixture {
        _dir: Some(dir),
        repo: Arc::new(DocumentPostRepository::new(store)),
    }
}

fn u1() -> User {
    User::new("alice", "aaaaaaaaaaaaaaaaaaaaaaaa")
}

fn u2() -> User {
    User::new("bob", "bbbbbbbbbbbbbbbbbbbbbbbb")
}

fn u3() -> User {
    User::new("carol", "cccccccccccccccccccccccc")
}

fn t(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + Duration::seconds(secs)
}

fn draft(category: Category) -> NewPost {
    NewPost {
        kind: PostType::Text,
        category,
        title: "title".into(),
        url: String::new(),
        text: "body".into(),
    }
}

fn add(repo: &dyn PostRepository, author: User, category: Category, at: i64) -> Post {
    repo.add_post(Post::new_at(author, draft(category), t(at)))
        .unwrap()
}

pub(crate) fn score_scenario(repo: &dyn PostRepository) {
    let post = add(repo, u1(), Category::Music, 0);
    assert_eq!((post.score(), post.likes_percent()), (1, 100));

    let post = repo.upvote_post(&post.id, &u2()).unwrap();
    assert_eq!((post.score(), post.likes_percent()), (2, 100));

    let post = repo.downvote_post(&post.id, &u1()).unwrap();
    assert_eq!(post.votes().likes_count(), 1);
    assert_eq!((post.score(), post.likes_percent()), (0, 50));

    let stored = repo.get_by_id(&post.id).unwrap();
    assert_eq!((stored.score(), stored.likes_percent()), (0, 50));
    assert_eq!(stored.votes().len(), 2);
}

pub(crate) fn unvote_is_idempotent(repo: &dyn PostRepository) {
    let post = add(repo, u1(), Category::Music, 0);
    repo.downvote_post(&post.id, &u2()).unwrap();
    let once = repo.unvote_post(&post.id, &u2()).unwrap();
    let twice = repo.unvote_post(&post.id, &u2()).unwrap();
    assert_eq!(once.votes(), twice.votes());
    assert_eq!(twice.score(), 1);
}

pub(crate) fn unvote_everything_zeroes_percent(repo: &dyn PostRepository) {
    let post = add(repo, u1(), Category::Music, 0);
    let post = repo.unvote_post(&post.id, &u1()).unwrap();
    assert!(post.votes().is_empty());
    assert_eq!((post.score(), post.likes_percent()), (0, 0));
}

pub(crate) fn get_all_breaks_ties_by_age(repo: &dyn PostRepository) {
    // Final scores 5, 5, 3; the older 5 must come first.
    let older = add(repo, u1(), Category::News, 0);
    let newer = add(repo, u1(), Category::News, 10);
    let low = add(repo, u1(), Category::Funny, 5);
    for (post, voters) in [(&newer, 4), (&older, 4), (&low, 2)] {
        for i in 0..voters {
            let voter = User::new(format!("v{i}"), format!("{:024x}", i + 1));
            repo.upvote_post(&post.id, &voter).unwrap();
        }
    }
    let ids: Vec<_> = repo.get_all().unwrap().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, [older.id.clone(), newer.id.clone(), low.id.clone()]);

    let scores: Vec<_> = repo.get_all().unwrap().iter().map(Post::score).collect();
    assert_eq!(scores, [5, 5, 3]);

    let news: Vec<_> = repo
        .get_by_category(Category::News)
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(news, [older.id, newer.id]);
}

pub(crate) fn unknown_category_is_empty(repo: &dyn PostRepository) {
    add(repo, u1(), Category::Music, 0);
    assert!(repo.get_by_category(Category::Fashion).unwrap().is_empty());
}

pub(crate) fn get_by_user_is_newest_first(repo: &dyn PostRepository) {
    let old = add(repo, u1(), Category::Music, 0);
    let new = add(repo, u1(), Category::Music, 60);
    add(repo, u2(), Category::Music, 30);
    // Score must not influence this order.
    repo.upvote_post(&old.id, &u2()).unwrap();
    repo.upvote_post(&old.id, &u3()).unwrap();

    let ids: Vec<_> = repo
        .get_by_user("alice")
        .unwrap()
        .into_iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(ids, [new.id, old.id]);
    assert!(repo.get_by_user("nobody").unwrap().is_empty());
}

pub(crate) fn get_by_id_counts_views(repo: &dyn PostRepository) {
    let post = add(repo, u1(), Category::Music, 0);
    assert_eq!(repo.get_by_id(&post.id).unwrap().views, 1);
    assert_eq!(repo.get_by_id(&post.id).unwrap().views, 2);
    assert!(matches!(
        repo.get_by_id("dddddddddddddddddddddddd"),
        Err(PostError::PostNotFound)
    ));
}

pub(crate) fn delete_post_rules(repo: &dyn PostRepository) {
    let post = add(repo, u1(), Category::Music, 0);
    assert!(matches!(
        repo.delete_post(&post.id, &u2()),
        Err(PostError::Unauthorized)
    ));
    assert_eq!(repo.delete_post(&post.id, &u1()).unwrap(), Deleted);
    assert!(matches!(
        repo.delete_post(&post.id, &u1()),
        Err(PostError::PostNotFound)
    ));
    assert!(repo.get_all().unwrap().is_empty());
}

pub(crate) fn comment_rules(repo: &dyn PostRepository) {
    let post = add(repo, u1(), Category::Music, 0);
    let comment = Comment::new(u2(), "nice");
    let comment_id = comment.id.clone();

    let post = repo.add_comment(&post.id, comment).unwrap();
    assert_eq!(post.comments().len(), 1);
    assert_eq!(post.comments().get(&comment_id).unwrap().body, "nice");

    assert!(matches!(
        repo.delete_comment(&post.id, "eeeeeeeeeeeeeeeeeeeeeeee", &u2()),
        Err(PostError::CommentNotFound)
    ));
    assert!(matches!(
        repo.delete_comment(&post.id, &comment_id, &u1()),
        Err(PostError::Unauthorized)
    ));
    let post = repo.delete_comment(&post.id, &comment_id, &u2()).unwrap();
    assert!(post.comments().is_empty());

    assert!(matches!(
        repo.add_comment("ffffffffffffffffffffffff", Comment::new(u2(), "x")),
        Err(PostError::PostNotFound)
    ));
}

pub(crate) fn delete_comment_on_fresh_post(repo: &dyn PostRepository) {
    let post = add(repo, u1(), Category::News, 0);
    assert!(post.comments().is_empty());
    assert!(matches!(
        repo.delete_comment(&post.id, "eeeeeeeeeeeeeeeeeeeeeeee", &u1()),
        Err(PostError::CommentNotFound)
    ));
}

pub(crate) fn views_saturate(repo: &dyn PostRepository) {
    let mut post = Post::new_at(u1(), draft(Category::Funny), t(0));
    post.views = u32::MAX;
    let post = repo.add_post(post).unwrap();
    assert_eq!(repo.get_by_id(&post.id).unwrap().views, u32::MAX);
}

pub(crate) fn votes_on_missing_post(repo: &dyn PostRepository) {
    let missing = "ffffffffffffffffffffffff";
    assert!(matches!(repo.upvote_post(missing, &u1()), Err(PostError::PostNotFound)));
    assert!(matches!(repo.downvote_post(missing, &u1()), Err(PostError::PostNotFound)));
    assert!(matches!(repo.unvote_post(missing, &u1()), Err(PostError::PostNotFound)));
}

macro_rules! repository_conformance {
    ($($backend:ident),* $(,)?) => {
        $(
            mod $backend {
                #[test]
                fn score_scenario() {
                    super::score_scenario(&*super::$backend().repo);
                }

                #[test]
                fn unvote_is_idempotent() {
                    super::unvote_is_idempotent(&*super::$backend().repo);
                }

                #[test]
                fn unvote_everything_zeroes_percent() {
                    super::unvote_everything_zeroes_percent(&*super::$backend().repo);
                }

                #[test]
                fn get_all_breaks_ties_by_age() {
                    super::get_all_breaks_ties_by_age(&*super::$backend().repo);
                }

                #[test]
                fn unknown_category_is_empty() {
                    super::unknown_category_is_empty(&*super::$backend().repo);
                }

                #[test]
                fn get_by_user_is_newest_first() {
                    super::get_by_user_is_newest_first(&*super::$backend().repo);
                }

                #[test]
                fn get_by_id_counts_views() {
                    super::get_by_id_counts_views(&*super::$backend().repo);
                }

                #[test]
                fn delete_post_rules() {
                    super::delete_post_rules(&*super::$backend().repo);
                }

                #[test]
                fn comment_rules() {
                    super::comment_rules(&*super::$backend().repo);
                }

                #[test]
                fn delete_comment_on_fresh_post() {
                    super::delete_comment_on_fresh_post(&*super::$backend().repo);
                }

                #[test]
                fn views_saturate() {
                    super::views_saturate(&*super::$backend().repo);
                }

                #[test]
                fn votes_on_missing_post() {
                    super::votes_on_missing_post(&*super::$backend().repo);
                }
            }
        )*
    };
}

repository_conformance!(memory, document_in_memory, document_on_disk);
