//! The paginated members listing page.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links,
    },
    member::{Member, get_members_page},
    navigation::NavBar,
    pagination::{Page, PageQuery, PaginationConfig, create_pagination_indicators, pagination_view},
};

/// The state needed for the members page.
#[derive(Debug, Clone)]
pub struct MembersPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for MembersPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// Render one page of members ordered by name.
pub async fn get_members_page_endpoint(
    State(state): State<MembersPageState>,
    Query(query): Query<PageQuery>,
) -> Result<Response, Error> {
    let config = &state.pagination_config;
    let page_number = query.page.unwrap_or(config.default_page).max(1);

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let page = get_members_page(page_number, config.members_page_size, &connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve members: {error}"))?;

    Ok(members_view(&page, config.max_pages).into_response())
}

fn members_view(page: &Page<Member>, max_pages: u64) -> Markup {
    let nav_bar = NavBar::new(endpoints::MEMBERS_VIEW).into_html();
    let indicators = create_pagination_indicators(page.number, page.page_count(), max_pages);
    let page_url = |page: u64| format!("{}?page={page}", endpoints::MEMBERS_VIEW);

    let table_row = |member: &Member| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_MEMBER_VIEW, member.id);
        let delete_url = endpoints::format_endpoint(endpoints::MEMBER, member.id);
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? Their transaction items will be kept.",
            member.name
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (member.name) }
                td class=(TABLE_CELL_STYLE) { (member.email) }
                td class=(TABLE_CELL_STYLE) { (member.phone.as_deref().unwrap_or("-")) }
                td class=(TABLE_CELL_STYLE) { (member.join_date) }
                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4 w-full lg:max-w-5xl"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Members" }

                    a href=(endpoints::NEW_MEMBER_VIEW) class=(LINK_STYLE) { "Add Member" }
                }

                div class="overflow-x-auto dark:bg-gray-800"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Phone" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Joined" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for member in &page.items {
                                (table_row(member))
                            }

                            @if page.items.is_empty() {
                                tr
                                {
                                    td
                                        colspan="5"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No members here. "
                                        a href=(endpoints::NEW_MEMBER_VIEW) class=(LINK_STYLE)
                                        {
                                            "Add a member"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination_view(&indicators, page_url))
            }
        }
    );

    base("Members", &[], &content)
}
