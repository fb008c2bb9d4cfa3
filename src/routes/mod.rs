pub mod activity;
pub mod auth;
pub mod health;
pub mod projects;
pub mod tasks;
pub mod users;

use actix_web::web;

use crate::auth::AuthMiddleware;

/// Registers the `/api/v1` routes.
///
/// The API root, `register`, `login` and `refresh` are public; everything else sits
/// behind `auth`. The root must come before the catch-all `scope("")`.
pub fn config(cfg: &mut web::ServiceConfig, auth: AuthMiddleware) {
    cfg.service(health::api_info).service(
        web::scope("/auth")
            .service(auth::register)
            .service(auth::login)
            .service(auth::refresh)
            .service(
                web::scope("")
                    .wrap(auth.clone())
                    .service(auth::me)
                    .service(auth::logout),
            ),
    )
    .service(
        web::scope("")
            .wrap(auth)
            .service(
                web::scope("/users")
                    .service(users::list_users)
                    .service(users::get_user)
                    .service(users::update_user)
                    .service(users::update_user_status)
                    .service(users::delete_user),
            )
            .service(
                web::scope("/projects")
                    .service(projects::list_projects)
                    .service(projects::create_project)
                    .service(projects::get_project)
                    .service(projects::update_project)
                    .service(projects::delete_project),
            )
            .service(
                web::scope("/tasks")
                    .service(tasks::get_tasks)
                    .service(tasks::create_task)
                    .service(tasks::get_task)
                    .service(tasks::update_task)
                    .service(tasks::update_task_status)
                    .service(tasks::delete_task),
            )
            .service(activity::list_activity),
    );
}
