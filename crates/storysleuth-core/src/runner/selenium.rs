/// The standalone Selenium server launched from the Run menu.
use super::command::CommandLine;
use crate::settings::SeleniumSettings;

/// `java -Dwebdriver.ie.driver=<driver> -jar <server jar> -port <port>`.
///
/// Paths are used as given; resolve them against the settings directory
/// first (see `Settings::resolved_selenium`).
pub fn build_selenium_command(settings: &SeleniumSettings) -> CommandLine {
    CommandLine::new(settings.java.clone())
        .arg(format!(
            "-Dwebdriver.ie.driver={}",
            settings.ie_driver.display()
        ))
        .arg("-jar")
        .arg(settings.server_jar.display().to_string())
        .arg("-port")
        .arg(settings.port.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn builds_server_command() {
        let settings = SeleniumSettings {
            java: "java".into(),
            server_jar: PathBuf::from("extra/selenium.jar"),
            ie_driver: PathBuf::from("extra/IEDriverServer.exe"),
            port: 4444,
        };
        assert_eq!(
            build_selenium_command(&settings).display(),
            "java -Dwebdriver.ie.driver=extra/IEDriverServer.exe -jar extra/selenium.jar -port 4444"
        );
    }
}
