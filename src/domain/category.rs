use crate::utils::error::{Result, ToolkitError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Presentation grouping for cash-flow categories. Not stored in the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryGroup {
    Inflow,
    Needs,
    Wants,
    Investments,
}

impl CategoryGroup {
    pub fn label(self) -> &'static str {
        match self {
            CategoryGroup::Inflow => "Inflow",
            CategoryGroup::Needs => "Outflow (needs)",
            CategoryGroup::Wants => "Outflow (wants)",
            CategoryGroup::Investments => "Outflow (investments)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    SalesRevenue,
    CustomerPrepayments,
    RoyaltiesAndLicensing,
    InvestmentReturns,
    GrantsAndSubsidies,
    FinancingActivities,
    AssetLiquidation,
    AffiliateReferral,
    RentAndUtilities,
    SalariesAndWages,
    SoftwareLicenses,
    RawMaterials,
    TaxesAndCompliance,
    Insurance,
    BrandingAndDesign,
    TeamRetreats,
    PremiumTools,
    MarketingCampaigns,
    OfficeDecor,
    ResearchAndDevelopment,
    CapitalExpenditure,
    HiringForScale,
    MarketExpansion,
    TrainingAndUpskilling,
    DataInfrastructure,
}

impl Category {
    /// Menu order.
    pub const ALL: [Category; 25] = [
        Category::SalesRevenue,
        Category::CustomerPrepayments,
        Category::RoyaltiesAndLicensing,
        Category::InvestmentReturns,
        Category::GrantsAndSubsidies,
        Category::FinancingActivities,
        Category::AssetLiquidation,
        Category::AffiliateReferral,
        Category::RentAndUtilities,
        Category::SalariesAndWages,
        Category::SoftwareLicenses,
        Category::RawMaterials,
        Category::TaxesAndCompliance,
        Category::Insurance,
        Category::BrandingAndDesign,
        Category::TeamRetreats,
        Category::PremiumTools,
        Category::MarketingCampaigns,
        Category::OfficeDecor,
        Category::ResearchAndDevelopment,
        Category::CapitalExpenditure,
        Category::HiringForScale,
        Category::MarketExpansion,
        Category::TrainingAndUpskilling,
        Category::DataInfrastructure,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::SalesRevenue => "Sales Revenue",
            Category::CustomerPrepayments => "Customer Prepayments",
            Category::RoyaltiesAndLicensing => "Royalties & Licensing",
            Category::InvestmentReturns => "Investment Returns",
            Category::GrantsAndSubsidies => "Grants & Subsidies",
            Category::FinancingActivities => "Financing Activities",
            Category::AssetLiquidation => "Asset Liquidation",
            Category::AffiliateReferral => "Affiliate/Referral",
            Category::RentAndUtilities => "Rent & Utilities",
            Category::SalariesAndWages => "Salaries & Wages",
            Category::SoftwareLicenses => "Software Licenses",
            Category::RawMaterials => "Raw Materials / Inventory",
            Category::TaxesAndCompliance => "Taxes & Compliance",
            Category::Insurance => "Insurance",
            Category::BrandingAndDesign => "Branding & Design",
            Category::TeamRetreats => "Team Retreats / Perks",
            Category::PremiumTools => "Premium Tools",
            Category::MarketingCampaigns => "Marketing Campaigns",
            Category::OfficeDecor => "Office Decor / Furniture",
            Category::ResearchAndDevelopment => "R&D",
            Category::CapitalExpenditure => "Capital Expenditure",
            Category::HiringForScale => "Hiring for Scale",
            Category::MarketExpansion => "Market Expansion",
            Category::TrainingAndUpskilling => "Training & Upskilling",
            Category::DataInfrastructure => "Data Infrastructure",
        }
    }

    pub fn group(self) -> CategoryGroup {
        match self {
            Category::SalesRevenue
            | Category::CustomerPrepayments
            | Category::RoyaltiesAndLicensing
            | Category::InvestmentReturns
            | Category::GrantsAndSubsidies
            | Category::FinancingActivities
            | Category::AssetLiquidation
            | Category::AffiliateReferral => CategoryGroup::Inflow,
            Category::RentAndUtilities
            | Category::SalariesAndWages
            | Category::SoftwareLicenses
            | Category::RawMaterials
            | Category::TaxesAndCompliance
            | Category::Insurance => CategoryGroup::Needs,
            Category::BrandingAndDesign
            | Category::TeamRetreats
            | Category::PremiumTools
            | Category::MarketingCampaigns
            | Category::OfficeDecor => CategoryGroup::Wants,
            Category::ResearchAndDevelopment
            | Category::CapitalExpenditure
            | Category::HiringForScale
            | Category::MarketExpansion
            | Category::TrainingAndUpskilling
            | Category::DataInfrastructure => CategoryGroup::Investments,
        }
    }

    /// 1-based position in the menu.
    pub fn from_index(index: usize) -> Result<Category> {
        index
            .checked_sub(1)
            .and_then(|i| Category::ALL.get(i).copied())
            .ok_or_else(|| {
                ToolkitError::validation(format!(
                    "Invalid category index {}. Choose 1-{}",
                    index,
                    Category::ALL.len()
                ))
            })
    }

    pub fn from_label(label: &str) -> Option<Category> {
        let wanted = label.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepts either a label ("Insurance") or a menu index ("14").
impl FromStr for Category {
    type Err = ToolkitError;

    fn from_str(s: &str) -> Result<Self> {
        if let Ok(index) = s.trim().parse::<usize>() {
            return Category::from_index(index);
        }
        Category::from_label(s)
            .ok_or_else(|| ToolkitError::validation(format!("Unknown category '{}'", s.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_sizes() {
        let count = |group: CategoryGroup| Category::ALL.iter().filter(|c| c.group() == group).count();
        assert_eq!(count(CategoryGroup::Inflow), 8);
        assert_eq!(count(CategoryGroup::Needs), 6);
        assert_eq!(count(CategoryGroup::Wants), 5);
        assert_eq!(count(CategoryGroup::Investments), 6);
    }

    #[test]
    fn test_parse_by_label_and_index() {
        assert_eq!("insurance".parse::<Category>().unwrap(), Category::Insurance);
        assert_eq!("R&D".parse::<Category>().unwrap(), Category::ResearchAndDevelopment);
        assert_eq!("1".parse::<Category>().unwrap(), Category::SalesRevenue);
        assert_eq!("25".parse::<Category>().unwrap(), Category::DataInfrastructure);
        assert!("0".parse::<Category>().is_err());
        assert!("26".parse::<Category>().is_err());
        assert!("Lottery".parse::<Category>().is_err());
    }
}
