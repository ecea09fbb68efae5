//! Canned system data served by the mock.
//!
//! Nothing here is measured. The numbers are illustrative and stay the same
//! for the lifetime of the process.

use serde::{Deserialize, Serialize};

const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub name: String,
    pub status: String,
    pub enabled: bool,
}

impl Service {
    fn new(name: &str, active: bool) -> Self {
        Self {
            name: name.to_string(),
            status: if active { "active" } else { "inactive" }.to_string(),
            enabled: active,
        }
    }
}

pub fn services() -> Vec<Service> {
    vec![
        Service::new("nginx", true),
        Service::new("sshd", true),
        Service::new("postgresql", false),
    ]
}

pub const CONFIGURATION: &str = r#"{ config, pkgs, ... }:
{
  imports = [ ./hardware-configuration.nix ];

  boot.loader.systemd-boot.enable = true;
  boot.loader.efi.canTouchEfiVariables = true;

  networking.hostName = "nixos";
  networking.networkmanager.enable = true;

  time.timeZone = "America/Chicago";

  i18n.defaultLocale = "en_US.UTF-8";

  services.xserver.enable = true;
  services.xserver.displayManager.gdm.enable = true;
  services.xserver.desktopManager.gnome.enable = true;

  users.users.demo = {
    isNormalUser = true;
    extraGroups = [ "wheel" ];
  };

  system.stateVersion = "25.11";
}"#;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuStats {
    pub usage: f64,
    pub cores: u32,
    #[serde(rename = "loadAverage")]
    pub load_average: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkStats {
    pub rx: u64,
    pub tx: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStats {
    pub cpu: CpuStats,
    pub memory: CapacityStats,
    pub disk: CapacityStats,
    pub network: NetworkStats,
}

pub fn system_stats() -> SystemStats {
    SystemStats {
        cpu: CpuStats {
            usage: 25.5,
            cores: 4,
            load_average: [0.5, 0.6, 0.4],
        },
        memory: CapacityStats {
            total: 8 * GIB,
            used: 4 * GIB,
            free: 4 * GIB,
        },
        disk: CapacityStats {
            total: 100 * GIB,
            used: 50 * GIB,
            free: 50 * GIB,
        },
        network: NetworkStats {
            rx: 1024 * 1024,
            tx: 512 * 1024,
        },
    }
}

/// Outcome of a configuration check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub warnings: Vec<String>,
    pub errors: Vec<String>,
}

/// Every configuration is reported valid; nothing is parsed.
pub fn validate_configuration(_content: Option<&str>) -> ValidationReport {
    ValidationReport {
        valid: true,
        warnings: Vec::new(),
        errors: Vec::new(),
    }
}
