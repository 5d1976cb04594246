use crate::config::AppConfig;
use crate::integrations::mailer::Mailer;
use crate::integrations::radius::RadiusOpsClient;
use crate::integrations::sms::ItexmoSmsClient;
use crate::integrations::xendit::XenditClient;
use crate::shared::utils::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub conn: DbPool,
    pub xendit: XenditClient,
    pub radius: RadiusOpsClient,
    pub sms: ItexmoSmsClient,
    pub mailer: Mailer,
}

impl AppState {
    pub fn new(config: AppConfig, conn: DbPool) -> Self {
        let xendit = XenditClient::new(&config.xendit);
        let radius = RadiusOpsClient::new(&config.radius);
        let sms = ItexmoSmsClient::new(&config.sms);
        let mailer = Mailer::new(&config.smtp);
        Self {
            config,
            conn,
            xendit,
            radius,
            sms,
            mailer,
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config.server)
            .field("conn", &"DbPool")
            .finish()
    }
}
