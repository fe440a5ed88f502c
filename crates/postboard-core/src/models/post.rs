use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "imagePath", default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

impl Post {
    /// True when `user_id` created this post.
    pub fn is_created_by(&self, user_id: &str) -> bool {
        !user_id.is_empty() && self.creator.as_deref() == Some(user_id)
    }
}

/// One page of posts plus the total number of posts on the server.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct PostsPage {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(rename = "maxPosts", default)]
    pub max_posts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_posts_page() {
        let json = r#"{
            "message": "Posts fetched successfully!",
            "posts": [
                {"_id": "p1", "title": "First", "content": "Hello", "imagePath": "http://img/1.png", "creator": "u1"},
                {"_id": "p2", "title": "Second", "content": "World", "creator": "u2"}
            ],
            "maxPosts": 7
        }"#;

        let page: PostsPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.max_posts, 7);
        assert_eq!(page.posts.len(), 2);
        assert_eq!(page.posts[0].id, "p1");
        assert_eq!(page.posts[0].image_path.as_deref(), Some("http://img/1.png"));
        assert!(page.posts[1].image_path.is_none());
    }

    #[test]
    fn test_is_created_by() {
        let post = Post {
            id: "p1".to_string(),
            title: "t".to_string(),
            content: "c".to_string(),
            image_path: None,
            creator: Some("u1".to_string()),
        };
        assert!(post.is_created_by("u1"));
        assert!(!post.is_created_by("u2"));
        assert!(!post.is_created_by(""));
    }
}
