use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;
use std::sync::Arc;

use crate::accounts::AccountStore;
use crate::auth::{PasswordVerifier, TokenService};
use crate::logger::RequestLogger;
use crate::middleware::AuthGate;
use crate::routes::{get_current_user, health_check, login, refresh};

pub fn run(
    listener: TcpListener,
    tokens: Arc<TokenService>,
    accounts: Arc<dyn AccountStore>,
    passwords: Arc<dyn PasswordVerifier>,
) -> Result<Server, std::io::Error> {
    let tokens_data = web::Data::from(tokens.clone());
    let accounts = web::Data::from(accounts);
    let passwords = web::Data::from(passwords);

    let server = HttpServer::new(move || {
        App::new()
            .wrap(RequestLogger)

            // Shared state
            .app_data(tokens_data.clone())
            .app_data(accounts.clone())
            .app_data(passwords.clone())

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/api/v1")
                    // Public routes
                    .route("/auth/login", web::post().to(login))
                    .route("/auth/refresh", web::post().to(refresh))

                    // Protected routes
                    .service(
                        web::resource("/auth/me")
                            .wrap(AuthGate::strict(tokens.clone()))
                            .route(web::get().to(get_current_user)),
                    ),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
