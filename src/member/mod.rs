//! Members of the organization, who pay fees that transaction items refer to.

mod core;
mod create;
mod db;
mod delete;
mod edit;
mod form;
mod members_page;

pub use core::{Member, MemberFormData, MemberId, MemberOption, NewMember};
pub use create::{create_member_endpoint, get_new_member_page};
pub use db::{
    create_member, create_member_table, delete_member, get_member, get_member_options,
    get_members_page, update_member,
};
pub use delete::delete_member_endpoint;
pub use edit::{get_edit_member_page, update_member_endpoint};
pub use members_page::get_members_page_endpoint;
