//! Conversions from domain views to response DTOs.

use std::vec::IntoIter;

use agora_core::comment_tree::CommentNode;
use agora_core::domain::{AuthorSummary, CommentView, PostId, PostView, User};
use agora_core::ports::MediaStorage;
use agora_core::services::Profile;
use agora_core::voting::VoteOutcome;
use agora_shared::dto::{
    AuthorResponse, CommentResponse, PostResponse, ProfileResponse, UserResponse, VoteResponse,
};

pub fn author(author: &AuthorSummary, media: &dyn MediaStorage) -> AuthorResponse {
    AuthorResponse {
        id: author.id.to_string(),
        username: author.username.clone(),
        avatar_url: author.avatar_ref.as_deref().map(|key| media.public_url(key)),
    }
}

pub fn post(view: PostView, media: &dyn MediaStorage) -> PostResponse {
    let PostView { post, author: by } = view;
    PostResponse {
        id: post.id.to_string(),
        image_url: post.image_ref.as_deref().map(|key| media.public_url(key)),
        title: post.title,
        content: post.content,
        slug: post.slug,
        image_ref: post.image_ref,
        vote_total: post.vote_total,
        author: author(&by, media),
        created_at: post.created_at.to_rfc3339(),
        updated_at: post.updated_at.to_rfc3339(),
    }
}

pub fn posts(views: Vec<PostView>, media: &dyn MediaStorage) -> Vec<PostResponse> {
    views.into_iter().map(|view| post(view, media)).collect()
}

/// A single comment with no replies attached.
pub fn comment(view: CommentView, media: &dyn MediaStorage) -> CommentResponse {
    let CommentView { comment, author: by } = view;
    CommentResponse {
        id: comment.id.to_string(),
        post_id: comment.post_id.to_string(),
        parent_id: comment.parent_id.map(|id| id.to_string()),
        content: comment.content,
        author: author(&by, media),
        created_at: comment.created_at.to_rfc3339(),
        replies: Vec::new(),
    }
}

/// Convert a whole forest, depth-first on an explicit stack.
pub fn comments(
    forest: Vec<CommentNode<CommentView>>,
    media: &dyn MediaStorage,
) -> Vec<CommentResponse> {
    let mut out = Vec::with_capacity(forest.len());
    let mut roots = forest.into_iter();
    let mut stack: Vec<(CommentResponse, IntoIter<CommentNode<CommentView>>)> = Vec::new();

    loop {
        let next = match stack.last_mut() {
            Some((_, pending)) => pending.next(),
            None => roots.next(),
        };
        if let Some(CommentNode { item, replies }) = next {
            stack.push((comment(item, media), replies.into_iter()));
            continue;
        }

        let Some((done, _)) = stack.pop() else {
            break;
        };
        match stack.last_mut() {
            Some((parent, _)) => parent.replies.push(done),
            None => out.push(done),
        }
    }
    out
}

/// Public directory entries; emails stay private.
pub fn users(users: &[User], media: &dyn MediaStorage) -> Vec<AuthorResponse> {
    users
        .iter()
        .map(|user| author(&user.summary(), media))
        .collect()
}

pub fn user(user: &User, media: &dyn MediaStorage) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        avatar_url: user.avatar_ref.as_deref().map(|key| media.public_url(key)),
        bio: user.bio.clone(),
        created_at: user.created_at.to_rfc3339(),
    }
}

pub fn profile(profile: Profile, media: &dyn MediaStorage) -> ProfileResponse {
    let Profile { user, posts: authored } = profile;
    ProfileResponse {
        id: user.id.to_string(),
        avatar_url: user.avatar_ref.as_deref().map(|key| media.public_url(key)),
        username: user.username,
        bio: user.bio,
        created_at: user.created_at.to_rfc3339(),
        posts: posts(authored, media),
    }
}

pub fn vote(post_id: PostId, outcome: VoteOutcome) -> VoteResponse {
    VoteResponse {
        post_id: post_id.to_string(),
        total: outcome.new_total,
        user_vote: outcome.new_user_vote.into(),
    }
}
