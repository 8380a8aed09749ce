//! ISO 3166-1 country table.
//!
//! `name` is the canonical spelling emitted by
//! [`canonicalize_country`](crate::country::canonicalize_country); `alternates`
//! holds ISO official names and registry spellings that map onto it.

pub(crate) struct Country {
    pub alpha2: &'static str,
    pub alpha3: &'static str,
    pub name: &'static str,
    pub alternates: &'static [&'static str],
}

impl Country {
    /// Canonical name followed by every alternate spelling.
    pub fn names(&self) -> impl Iterator<Item = &'static str> {
        std::iter::once(self.name).chain(self.alternates.iter().copied())
    }
}

const fn c(
    alpha2: &'static str,
    alpha3: &'static str,
    name: &'static str,
    alternates: &'static [&'static str],
) -> Country {
    Country { alpha2, alpha3, name, alternates }
}

pub(crate) const COUNTRIES: &[Country] = &[
    c("AD", "AND", "Andorra", &[]),
    c("AE", "ARE", "United Arab Emirates", &["UAE"]),
    c("AF", "AFG", "Afghanistan", &[]),
    c("AG", "ATG", "Antigua and Barbuda", &[]),
    c("AI", "AIA", "Anguilla", &[]),
    c("AL", "ALB", "Albania", &[]),
    c("AM", "ARM", "Armenia", &[]),
    c("AO", "AGO", "Angola", &[]),
    c("AQ", "ATA", "Antarctica", &[]),
    c("AR", "ARG", "Argentina", &[]),
    c("AS", "ASM", "American Samoa", &[]),
    c("AT", "AUT", "Austria", &[]),
    c("AU", "AUS", "Australia", &[]),
    c("AW", "ABW", "Aruba", &[]),
    c("AX", "ALA", "Åland Islands", &["Aland Islands"]),
    c("AZ", "AZE", "Azerbaijan", &[]),
    c("BA", "BIH", "Bosnia and Herzegovina", &["Bosnia-Herzegovina"]),
    c("BB", "BRB", "Barbados", &[]),
    c("BD", "BGD", "Bangladesh", &[]),
    c("BE", "BEL", "Belgium", &[]),
    c("BF", "BFA", "Burkina Faso", &[]),
    c("BG", "BGR", "Bulgaria", &[]),
    c("BH", "BHR", "Bahrain", &[]),
    c("BI", "BDI", "Burundi", &[]),
    c("BJ", "BEN", "Benin", &[]),
    c("BL", "BLM", "Saint Barthélemy", &["Saint Barthelemy"]),
    c("BM", "BMU", "Bermuda", &[]),
    c("BN", "BRN", "Brunei", &["Brunei Darussalam"]),
    c("BO", "BOL", "Bolivia", &["Bolivia, Plurinational State of", "Plurinational State of Bolivia"]),
    c("BQ", "BES", "Bonaire, Sint Eustatius and Saba", &[]),
    c("BR", "BRA", "Brazil", &[]),
    c("BS", "BHS", "Bahamas", &["The Bahamas"]),
    c("BT", "BTN", "Bhutan", &[]),
    c("BV", "BVT", "Bouvet Island", &[]),
    c("BW", "BWA", "Botswana", &[]),
    c("BY", "BLR", "Belarus", &[]),
    c("BZ", "BLZ", "Belize", &[]),
    c("CA", "CAN", "Canada", &[]),
    c("CC", "CCK", "Cocos (Keeling) Islands", &["Cocos Islands"]),
    c(
        "CD",
        "COD",
        "Democratic Republic of the Congo",
        &["Congo, The Democratic Republic of the", "Congo, Democratic Republic of the", "DR Congo"],
    ),
    c("CF", "CAF", "Central African Republic", &[]),
    c("CG", "COG", "Congo", &["Republic of the Congo", "Congo, Republic of the"]),
    c("CH", "CHE", "Switzerland", &[]),
    c("CI", "CIV", "Côte d'Ivoire", &["Cote d'Ivoire", "Ivory Coast"]),
    c("CK", "COK", "Cook Islands", &[]),
    c("CL", "CHL", "Chile", &[]),
    c("CM", "CMR", "Cameroon", &[]),
    c("CN", "CHN", "China", &[]),
    c("CO", "COL", "Colombia", &[]),
    c("CR", "CRI", "Costa Rica", &[]),
    c("CU", "CUB", "Cuba", &[]),
    c("CV", "CPV", "Cabo Verde", &["Cape Verde"]),
    c("CW", "CUW", "Curaçao", &["Curacao"]),
    c("CX", "CXR", "Christmas Island", &[]),
    c("CY", "CYP", "Cyprus", &[]),
    c("CZ", "CZE", "Czechia", &["Czech Republic"]),
    c("DE", "DEU", "Germany", &["Federal Republic of Germany"]),
    c("DJ", "DJI", "Djibouti", &[]),
    c("DK", "DNK", "Denmark", &[]),
    c("DM", "DMA", "Dominica", &[]),
    c("DO", "DOM", "Dominican Republic", &[]),
    c("DZ", "DZA", "Algeria", &[]),
    c("EC", "ECU", "Ecuador", &[]),
    c("EE", "EST", "Estonia", &[]),
    c("EG", "EGY", "Egypt", &[]),
    c("EH", "ESH", "Western Sahara", &[]),
    c("ER", "ERI", "Eritrea", &[]),
    c("ES", "ESP", "Spain", &[]),
    c("ET", "ETH", "Ethiopia", &[]),
    c("FI", "FIN", "Finland", &[]),
    c("FJ", "FJI", "Fiji", &[]),
    c("FK", "FLK", "Falkland Islands", &["Falkland Islands (Malvinas)"]),
    c("FM", "FSM", "Micronesia", &["Micronesia, Federated States of"]),
    c("FO", "FRO", "Faroe Islands", &[]),
    c("FR", "FRA", "France", &[]),
    c("GA", "GAB", "Gabon", &[]),
    c("GB", "GBR", "United Kingdom", &["United Kingdom of Great Britain and Northern Ireland"]),
    c("GD", "GRD", "Grenada", &[]),
    c("GE", "GEO", "Georgia", &[]),
    c("GF", "GUF", "French Guiana", &[]),
    c("GG", "GGY", "Guernsey", &[]),
    c("GH", "GHA", "Ghana", &[]),
    c("GI", "GIB", "Gibraltar", &[]),
    c("GL", "GRL", "Greenland", &[]),
    c("GM", "GMB", "Gambia", &["The Gambia"]),
    c("GN", "GIN", "Guinea", &[]),
    c("GP", "GLP", "Guadeloupe", &[]),
    c("GQ", "GNQ", "Equatorial Guinea", &[]),
    c("GR", "GRC", "Greece", &[]),
    c("GS", "SGS", "South Georgia and the South Sandwich Islands", &[]),
    c("GT", "GTM", "Guatemala", &[]),
    c("GU", "GUM", "Guam", &[]),
    c("GW", "GNB", "Guinea-Bissau", &[]),
    c("GY", "GUY", "Guyana", &[]),
    c("HK", "HKG", "Hong Kong", &[]),
    c("HM", "HMD", "Heard Island and McDonald Islands", &[]),
    c("HN", "HND", "Honduras", &[]),
    c("HR", "HRV", "Croatia", &[]),
    c("HT", "HTI", "Haiti", &[]),
    c("HU", "HUN", "Hungary", &[]),
    c("ID", "IDN", "Indonesia", &[]),
    c("IE", "IRL", "Ireland", &[]),
    c("IL", "ISR", "Israel", &[]),
    c("IM", "IMN", "Isle of Man", &[]),
    c("IN", "IND", "India", &[]),
    c("IO", "IOT", "British Indian Ocean Territory", &[]),
    c("IQ", "IRQ", "Iraq", &[]),
    c("IR", "IRN", "Iran", &["Iran, Islamic Republic of", "Islamic Republic of Iran"]),
    c("IS", "ISL", "Iceland", &[]),
    c("IT", "ITA", "Italy", &[]),
    c("JE", "JEY", "Jersey", &[]),
    c("JM", "JAM", "Jamaica", &[]),
    c("JO", "JOR", "Jordan", &[]),
    c("JP", "JPN", "Japan", &[]),
    c("KE", "KEN", "Kenya", &[]),
    c("KG", "KGZ", "Kyrgyzstan", &[]),
    c("KH", "KHM", "Cambodia", &[]),
    c("KI", "KIR", "Kiribati", &[]),
    c("KM", "COM", "Comoros", &[]),
    c("KN", "KNA", "Saint Kitts and Nevis", &[]),
    c(
        "KP",
        "PRK",
        "North Korea",
        &["Korea, Democratic People's Republic of", "Democratic People's Republic of Korea"],
    ),
    c("KR", "KOR", "South Korea", &["Korea, Republic of", "Republic of Korea"]),
    c("KW", "KWT", "Kuwait", &[]),
    c("KY", "CYM", "Cayman Islands", &[]),
    c("KZ", "KAZ", "Kazakhstan", &[]),
    c("LA", "LAO", "Laos", &["Lao People's Democratic Republic"]),
    c("LB", "LBN", "Lebanon", &[]),
    c("LC", "LCA", "Saint Lucia", &[]),
    c("LI", "LIE", "Liechtenstein", &[]),
    c("LK", "LKA", "Sri Lanka", &[]),
    c("LR", "LBR", "Liberia", &[]),
    c("LS", "LSO", "Lesotho", &[]),
    c("LT", "LTU", "Lithuania", &[]),
    c("LU", "LUX", "Luxembourg", &[]),
    c("LV", "LVA", "Latvia", &[]),
    c("LY", "LBY", "Libya", &["Libyan Arab Jamahiriya"]),
    c("MA", "MAR", "Morocco", &[]),
    c("MC", "MCO", "Monaco", &[]),
    c("MD", "MDA", "Moldova", &["Moldova, Republic of", "Republic of Moldova"]),
    c("ME", "MNE", "Montenegro", &[]),
    c("MF", "MAF", "Saint Martin", &["Saint Martin (French part)"]),
    c("MG", "MDG", "Madagascar", &[]),
    c("MH", "MHL", "Marshall Islands", &[]),
    c(
        "MK",
        "MKD",
        "North Macedonia",
        &["Macedonia", "Macedonia, The Former Yugoslav Republic of", "Republic of North Macedonia"],
    ),
    c("ML", "MLI", "Mali", &[]),
    c("MM", "MMR", "Myanmar", &["Burma"]),
    c("MN", "MNG", "Mongolia", &[]),
    c("MO", "MAC", "Macao", &["Macau"]),
    c("MP", "MNP", "Northern Mariana Islands", &[]),
    c("MQ", "MTQ", "Martinique", &[]),
    c("MR", "MRT", "Mauritania", &[]),
    c("MS", "MSR", "Montserrat", &[]),
    c("MT", "MLT", "Malta", &[]),
    c("MU", "MUS", "Mauritius", &[]),
    c("MV", "MDV", "Maldives", &[]),
    c("MW", "MWI", "Malawi", &[]),
    c("MX", "MEX", "Mexico", &[]),
    c("MY", "MYS", "Malaysia", &[]),
    c("MZ", "MOZ", "Mozambique", &[]),
    c("NA", "NAM", "Namibia", &[]),
    c("NC", "NCL", "New Caledonia", &[]),
    c("NE", "NER", "Niger", &[]),
    c("NF", "NFK", "Norfolk Island", &[]),
    c("NG", "NGA", "Nigeria", &[]),
    c("NI", "NIC", "Nicaragua", &[]),
    c("NL", "NLD", "Netherlands", &["The Netherlands", "Holland", "Netherlands, Kingdom of the"]),
    c("NO", "NOR", "Norway", &[]),
    c("NP", "NPL", "Nepal", &[]),
    c("NR", "NRU", "Nauru", &[]),
    c("NU", "NIU", "Niue", &[]),
    c("NZ", "NZL", "New Zealand", &[]),
    c("OM", "OMN", "Oman", &[]),
    c("PA", "PAN", "Panama", &[]),
    c("PE", "PER", "Peru", &[]),
    c("PF", "PYF", "French Polynesia", &[]),
    c("PG", "PNG", "Papua New Guinea", &[]),
    c("PH", "PHL", "Philippines", &[]),
    c("PK", "PAK", "Pakistan", &[]),
    c("PL", "POL", "Poland", &[]),
    c("PM", "SPM", "Saint Pierre and Miquelon", &[]),
    c("PN", "PCN", "Pitcairn", &[]),
    c("PR", "PRI", "Puerto Rico", &[]),
    c(
        "PS",
        "PSE",
        "Palestine",
        &["Palestine, State of", "Palestinian Territory, Occupied", "Palestinian Territories"],
    ),
    c("PT", "PRT", "Portugal", &[]),
    c("PW", "PLW", "Palau", &[]),
    c("PY", "PRY", "Paraguay", &[]),
    c("QA", "QAT", "Qatar", &[]),
    c("RE", "REU", "Réunion", &["Reunion"]),
    c("RO", "ROU", "Romania", &[]),
    c("RS", "SRB", "Serbia", &[]),
    c("RU", "RUS", "Russia", &["Russian Federation"]),
    c("RW", "RWA", "Rwanda", &[]),
    c("SA", "SAU", "Saudi Arabia", &[]),
    c("SB", "SLB", "Solomon Islands", &[]),
    c("SC", "SYC", "Seychelles", &[]),
    c("SD", "SDN", "Sudan", &[]),
    c("SE", "SWE", "Sweden", &[]),
    c("SG", "SGP", "Singapore", &[]),
    c("SH", "SHN", "Saint Helena", &["Saint Helena, Ascension and Tristan da Cunha"]),
    c("SI", "SVN", "Slovenia", &[]),
    c("SJ", "SJM", "Svalbard and Jan Mayen", &[]),
    c("SK", "SVK", "Slovakia", &["Slovak Republic"]),
    c("SL", "SLE", "Sierra Leone", &[]),
    c("SM", "SMR", "San Marino", &[]),
    c("SN", "SEN", "Senegal", &[]),
    c("SO", "SOM", "Somalia", &[]),
    c("SR", "SUR", "Suriname", &[]),
    c("SS", "SSD", "South Sudan", &[]),
    c("ST", "STP", "Sao Tome and Principe", &["São Tomé and Príncipe"]),
    c("SV", "SLV", "El Salvador", &[]),
    c("SX", "SXM", "Sint Maarten", &["Sint Maarten (Dutch part)"]),
    c("SY", "SYR", "Syria", &["Syrian Arab Republic"]),
    c("SZ", "SWZ", "Eswatini", &["Swaziland"]),
    c("TC", "TCA", "Turks and Caicos Islands", &[]),
    c("TD", "TCD", "Chad", &[]),
    c("TF", "ATF", "French Southern Territories", &[]),
    c("TG", "TGO", "Togo", &[]),
    c("TH", "THA", "Thailand", &[]),
    c("TJ", "TJK", "Tajikistan", &[]),
    c("TK", "TKL", "Tokelau", &[]),
    c("TL", "TLS", "Timor-Leste", &["East Timor"]),
    c("TM", "TKM", "Turkmenistan", &[]),
    c("TN", "TUN", "Tunisia", &[]),
    c("TO", "TON", "Tonga", &[]),
    c("TR", "TUR", "Turkey", &["Türkiye", "Turkiye"]),
    c("TT", "TTO", "Trinidad and Tobago", &[]),
    c("TV", "TUV", "Tuvalu", &[]),
    c("TW", "TWN", "Taiwan", &["Taiwan, Province of China"]),
    c("TZ", "TZA", "Tanzania", &["Tanzania, United Republic of", "United Republic of Tanzania"]),
    c("UA", "UKR", "Ukraine", &[]),
    c("UG", "UGA", "Uganda", &[]),
    c("UM", "UMI", "United States Minor Outlying Islands", &[]),
    c("US", "USA", "United States", &["United States of America"]),
    c("UY", "URY", "Uruguay", &[]),
    c("UZ", "UZB", "Uzbekistan", &[]),
    c("VA", "VAT", "Holy See", &["Vatican City", "Holy See (Vatican City State)"]),
    c("VC", "VCT", "Saint Vincent and the Grenadines", &[]),
    c(
        "VE",
        "VEN",
        "Venezuela",
        &["Venezuela, Bolivarian Republic of", "Bolivarian Republic of Venezuela"],
    ),
    c("VG", "VGB", "British Virgin Islands", &["Virgin Islands, British"]),
    c("VI", "VIR", "U.S. Virgin Islands", &["Virgin Islands, U.S."]),
    c("VN", "VNM", "Vietnam", &["Viet Nam"]),
    c("VU", "VUT", "Vanuatu", &[]),
    c("WF", "WLF", "Wallis and Futuna", &[]),
    c("WS", "WSM", "Samoa", &[]),
    c("YE", "YEM", "Yemen", &[]),
    c("YT", "MYT", "Mayotte", &[]),
    c("ZA", "ZAF", "South Africa", &[]),
    c("ZM", "ZMB", "Zambia", &[]),
    c("ZW", "ZWE", "Zimbabwe", &[]),
];
