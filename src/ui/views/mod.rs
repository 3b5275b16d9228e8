mod login;
mod record_form;
mod records;
mod register;
mod report;

pub use login::LoginView;
pub use record_form::RecordFormView;
pub use records::RecordsView;
pub use register::RegisterView;
pub use report::ReportView;
