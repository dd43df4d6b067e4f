//! GraphQL documents sent to the upstream provider.

pub const ITEMS: &str = r#"query Items($lang: LanguageCode) {
  items(lang: $lang) {
    id
    name
    shortName
    basePrice
    avg24hPrice
    fleaMarketFee
    iconLink
    types
    wikiLink
    weight
    width
    height
    category { name }
    buyFor { price currency vendor { name } }
    bartersFor {
      trader { name }
      requiredItems { item { name } count }
    }
  }
}"#;

pub const ITEM: &str = r#"query Item($id: ID, $lang: LanguageCode) {
  item(id: $id, lang: $lang) {
    id
    name
    shortName
    description
    basePrice
    fleaMarketFee
    iconLink
    types
    wikiLink
    weight
    width
    height
    sellFor { price currency vendor { name } }
    buyFor { price currency vendor { name } }
    containsItems {
      item { id name shortName iconLink }
      count
      quantity
    }
    usedInTasks {
      id
      name
      trader { name }
    }
  }
}"#;

pub const TRADERS: &str = r#"query Traders($lang: LanguageCode) {
  traders(lang: $lang) {
    id
    name
    imageLink
    currency { name }
    levels {
      level
      requiredPlayerLevel
      requiredReputation
      requiredCommerce
    }
    barters {
      id
      level
      requiredItems {
        item { id name shortName iconLink }
        count
        quantity
      }
      rewardItems {
        item { id name shortName iconLink }
        count
        quantity
      }
    }
    cashOffers {
      item { id name shortName iconLink }
      minTraderLevel
      price
      currency
    }
  }
}"#;

pub const TASKS: &str = r#"query Tasks($lang: LanguageCode) {
  tasks(lang: $lang) {
    id
    name
    trader { name }
    map { name }
    experience
    minPlayerLevel
    wikiLink
    taskImageLink
    taskRequirements { task { name } }
    traderRequirements {
      trader { name }
      requirementType
      compareMethod
      value
    }
    objectives {
      type
      description
      maps { name }
      optional
    }
    startRewards { ...Rewards }
    finishRewards { ...Rewards }
  }
}

fragment Rewards on TaskRewards {
  items {
    item { id name shortName iconLink }
    count
    quantity
  }
  traderStanding {
    trader { name }
    standing
  }
  offerUnlock {
    trader { name }
    level
    item { name }
  }
}"#;
