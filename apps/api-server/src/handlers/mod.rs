//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod friends;
mod health;
mod media;
mod posts;
mod saved;
mod users;
mod views;
mod votes;

#[cfg(test)]
mod tests;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Literal segments go before `{id}`
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list))
                    .route("", web::post().to(posts::create))
                    .route("/search", web::get().to(posts::search))
                    .route("/slug/{slug}", web::get().to(posts::get_by_slug))
                    .route("/{id}", web::get().to(posts::get))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::delete))
                    .route("/{id}/comments", web::get().to(comments::list_for_post))
                    .route("/{id}/comments", web::post().to(comments::create))
                    .route("/{id}/vote", web::get().to(votes::current))
                    .route("/{id}/vote", web::post().to(votes::cast))
                    .route("/{id}/save", web::get().to(saved::status))
                    .route("/{id}/save", web::post().to(saved::save))
                    .route("/{id}/save", web::delete().to(saved::unsave)),
            )
            .route("/comments/{id}", web::delete().to(comments::delete))
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::directory))
                    .route("/me", web::put().to(users::update_me))
                    .route("/me/saved", web::get().to(saved::list))
                    .route("/me/votes", web::get().to(votes::mine))
                    .route("/{id}", web::get().to(users::profile))
                    .route("/{id}/friend", web::post().to(friends::add))
                    .route("/{id}/friend", web::delete().to(friends::remove))
                    .route("/{id}/friends", web::get().to(friends::list)),
            )
            .route("/media", web::post().to(media::upload)),
    );
}
