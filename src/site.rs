//! Bot-list sites known to BotBlock.

use std::fmt;

/// A bot-list site BotBlock can forward guild counts to.
///
/// Any other host can still be used as a plain string key in
/// [`CredentialStore`](crate::CredentialStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum Site {
    BotlistSpace,
    BotsForDiscord,
    BotsOnDiscord,
    DiscordAppsDev,
    DiscordBoats,
    DiscordBotsOrg,
    DiscordBotList,
    DiscordBotReviews,
    DiscordBotWorld,
    DiscordBotsGg,
    DiscordServices,
    DiscordsBestBots,
    DiscordBotsFun,
    DivineDiscordBots,
    LBots,
    WonderBotList,
}

impl Site {
    /// All known sites.
    pub const ALL: [Site; 16] = [
        Site::BotlistSpace,
        Site::BotsForDiscord,
        Site::BotsOnDiscord,
        Site::DiscordAppsDev,
        Site::DiscordBoats,
        Site::DiscordBotsOrg,
        Site::DiscordBotList,
        Site::DiscordBotReviews,
        Site::DiscordBotWorld,
        Site::DiscordBotsGg,
        Site::DiscordServices,
        Site::DiscordsBestBots,
        Site::DiscordBotsFun,
        Site::DivineDiscordBots,
        Site::LBots,
        Site::WonderBotList,
    ];

    /// Hostname used as the site key in the payload.
    pub const fn host(self) -> &'static str {
        match self {
            Site::BotlistSpace => "botlist.space",
            Site::BotsForDiscord => "botsfordiscord.com",
            Site::BotsOnDiscord => "bots.ondiscord.xyz",
            Site::DiscordAppsDev => "discordapps.dev",
            Site::DiscordBoats => "discord.boats",
            Site::DiscordBotsOrg => "discordbots.org",
            Site::DiscordBotList => "discordbotlist.com",
            Site::DiscordBotReviews => "discordbotreviews.xyz",
            Site::DiscordBotWorld => "discordbot.world",
            Site::DiscordBotsGg => "discord.bots.gg",
            Site::DiscordServices => "discord.services",
            Site::DiscordsBestBots => "discordsbestbots.xyz",
            Site::DiscordBotsFun => "discordbots.fun",
            Site::DivineDiscordBots => "divinediscordbots.com",
            Site::LBots => "lbots.org",
            Site::WonderBotList => "wonderbotlist.com",
        }
    }

    /// Look up a known site by hostname.
    pub fn from_host(host: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|site| site.host() == host)
    }
}

impl AsRef<str> for Site {
    fn as_ref(&self) -> &str {
        self.host()
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host())
    }
}
